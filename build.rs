fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Source a protoc binary when one is not available on the system PATH so
    // the proto compile step below can run in minimal build environments.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", protoc);
        }
    }

    tonic_build::configure()
        .compile_protos(&["proto/datastore.proto"], &["proto"])
        .unwrap_or_else(|e| panic!("protobuf compile error: {}", e));

    Ok(())
}
