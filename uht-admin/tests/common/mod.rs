//! Shared fixtures for uht-admin integration tests
//!
//! - a three-object catalog: Account (tracked), Contact, and one custom object
//! - field lists for Account and Contact
//! - console construction over a `MockGateway` with a `NotificationLog`
#![allow(dead_code)]

use uht_admin::{
    mock::{MockGateway, field, object},
    prelude::*,
};

pub type TestConsole = Console<MockGateway, NotificationLog>;

pub fn mock_objects() -> Vec<ObjectInfo> {
    vec![
        object("Account", "Account", true, false),
        object("Contact", "Contact", false, false),
        object("Custom_Object__c", "Custom Object", false, true),
    ]
}

pub fn account_fields() -> Vec<FieldInfo> {
    vec![
        field("Name", "Account Name", FieldType::Text, true),
        field("Industry", "Industry", FieldType::Picklist, false),
        field("AnnualRevenue", "Annual Revenue", FieldType::Currency, false),
    ]
}

pub fn contact_fields() -> Vec<FieldInfo> {
    vec![
        field("FirstName", "First Name", FieldType::Text, false),
        field("LastName", "Last Name", FieldType::Text, false),
        field("Email", "Email", FieldType::Email, false),
    ]
}

pub fn mock_gateway() -> MockGateway {
    MockGateway::new()
        .with_objects(mock_objects())
        .with_fields_for("Account", account_fields())
        .with_fields_for("Contact", contact_fields())
}

/// Console over `gateway`, not yet loaded
pub fn console_with(gateway: MockGateway) -> (TestConsole, NotificationLog) {
    let notices = NotificationLog::new();
    let console = Console::new(gateway, notices.clone());
    (console, notices)
}

/// Console over `gateway` with the initial object load settled
pub async fn loaded_console(gateway: MockGateway) -> (TestConsole, NotificationLog) {
    let (mut console, notices) = console_with(gateway);
    let task = console.load();
    console.settle(task).await;
    (console, notices)
}

/// Runs an optional task to completion
pub async fn settle_opt(console: &mut TestConsole, task: Option<Task>) {
    if let Some(task) = task {
        console.settle(task).await;
    }
}

/// Expands `object_api_name` and waits for its fields
pub async fn expand(console: &mut TestConsole, object_api_name: &str) {
    let task = console.toggle_expanded(object_api_name);
    settle_opt(console, task).await;
}

pub fn field_selected(console: &TestConsole, object_api_name: &str, field_api_name: &str) -> bool {
    console
        .object(object_api_name)
        .and_then(|o| o.field(field_api_name))
        .is_some_and(|f| f.is_selected)
}

pub fn object_selected(console: &TestConsole, object_api_name: &str) -> bool {
    console
        .object(object_api_name)
        .is_some_and(|o| o.is_selected)
}
