//! Shared fixtures for the integration tests.

use std::collections::HashMap;

use ds_testkit::proto::v1::key::path_element::IdType;
use ds_testkit::proto::v1::key::PathElement;
use ds_testkit::proto::v1::value::ValueType;
use ds_testkit::proto::v1::Entity;
use ds_testkit::proto::v1::EntityResult;
use ds_testkit::proto::v1::Key;
use ds_testkit::proto::v1::LookupRequest;
use ds_testkit::proto::v1::PartitionId;
use ds_testkit::proto::v1::Value;

pub const PROJECT_ID: &str = "test-project";

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

pub fn sample_key(kind: &str, id: i64) -> Key {
    Key {
        partition_id: Some(PartitionId {
            project_id: PROJECT_ID.to_string(),
            namespace_id: String::new(),
        }),
        path: vec![PathElement {
            kind: kind.to_string(),
            id_type: Some(IdType::Id(id)),
        }],
    }
}

#[allow(dead_code)]
pub fn lookup_request(id: i64) -> LookupRequest {
    LookupRequest {
        project_id: PROJECT_ID.to_string(),
        read_options: None,
        keys: vec![sample_key("Task", id)],
    }
}

#[allow(dead_code)]
pub fn task_entity_result(id: i64, done: bool) -> EntityResult {
    let mut properties = HashMap::new();
    properties.insert(
        "done".to_string(),
        Value {
            value_type: Some(ValueType::BooleanValue(done)),
            exclude_from_indexes: false,
        },
    );
    EntityResult {
        entity: Some(Entity {
            key: Some(sample_key("Task", id)),
            properties,
        }),
        version: id,
        cursor: Vec::new(),
    }
}
