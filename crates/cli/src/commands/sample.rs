//! `canary sample`: Print a sample execution context.
//!
//! The output is valid input for `canary render`.

use canary_core::{
    ColumnSet, ConditionExpression, ConditionOperator, Entity, EntityCollection, EntityReference,
    ExecutionContext, ParameterCollection, QueryExpression, Value,
};
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&sample_context())?;
    println!("{json}");
    Ok(())
}

/// An `Update` of an account (stage 20) triggered by an internal-stage
/// `RetrieveMultiple`.
pub fn sample_context() -> ExecutionContext {
    let account_id = Uuid::new_v4();
    let owner = EntityReference::new("systemuser", Uuid::new_v4()).with_name("Jo Admin");

    let target = Entity::new("account", account_id)
        .with("name", "Acme")
        .with("revenue", Value::money(Decimal::new(50000, 2)))
        .with("industrycode", Value::OptionSetValue(7))
        .with("ownerid", owner)
        .with("modifiedon", Utc::now())
        .with("description", "First line\nSecond line");

    let pre_image = Entity::new("account", account_id)
        .with("name", "Acme Ltd")
        .with("revenue", Value::money(Decimal::new(42000, 2)));

    let query = QueryExpression::new("contact")
        .with_columns(ColumnSet::new(["fullname", "emailaddress1"]))
        .with_condition(ConditionExpression::new(
            "parentcustomerid",
            ConditionOperator::Equal,
            vec![Value::Guid(account_id)],
        ));

    let contacts = EntityCollection::new(
        "contact",
        vec![Entity::new("contact", Uuid::new_v4()).with("fullname", "Sam Contact")],
    );

    let parent = ExecutionContext {
        message_name: "RetrieveMultiple".into(),
        stage: Some(30),
        primary_entity_name: "contact".into(),
        input_parameters: Some(ParameterCollection::new().with("Query", query)),
        output_parameters: Some(
            ParameterCollection::new().with("BusinessEntityCollection", contacts),
        ),
        ..Default::default()
    };

    ExecutionContext {
        message_name: "Update".into(),
        stage: Some(20),
        depth: 1,
        primary_entity_name: "account".into(),
        primary_entity_id: account_id,
        user_id: Some(Uuid::new_v4()),
        user_agent: Some("canary-sample/1.0".into()),
        input_parameters: Some(ParameterCollection::new().with("Target", target)),
        shared_variables: Some(ParameterCollection::new().with("IsAutoTransact", true)),
        pre_entity_images: Some(ParameterCollection::new().with("PreImage", pre_image)),
        parent_context: Some(Box::new(parent)),
        ..Default::default()
    }
}
