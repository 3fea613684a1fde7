use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use schoolhub_core::{ItemId, StaffId};
use schoolhub_inventory::{
    InventoryItem, IssueRecord, ItemPatch, LedgerEntry, Movement, NewItem, NewStaff, Quantity,
    StaffMember,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------
//
// Required fields are `Option` so a missing one becomes a 400 with a message
// naming it instead of an extractor rejection.

#[derive(Debug, Deserialize)]
pub struct IssueItemRequest {
    pub item_id: Option<i64>,
    pub faculty_id: Option<i64>,
    pub quantity_issued: Option<i64>,
}

impl IssueItemRequest {
    pub fn into_parts(self) -> Result<(ItemId, StaffId, Quantity), axum::response::Response> {
        let item_id = required(self.item_id, "item_id")?;
        let faculty_id = required(self.faculty_id, "faculty_id")?;
        let quantity = quantity(required(self.quantity_issued, "quantity_issued")?)?;
        Ok((ItemId::new(item_id), StaffId::new(faculty_id), quantity))
    }
}

#[derive(Debug, Deserialize)]
pub struct ReturnItemRequest {
    pub return_quantity: Option<i64>,
}

impl ReturnItemRequest {
    pub fn quantity(self) -> Result<Quantity, axum::response::Response> {
        quantity(required(self.return_quantity, "return_quantity")?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub total_quantity: Option<i64>,
}

impl CreateItemRequest {
    pub fn into_new_item(self) -> Result<NewItem, axum::response::Response> {
        Ok(NewItem {
            name: required(self.name, "name")?,
            category: self.category,
            description: self.description,
            total_quantity: required(self.total_quantity, "total_quantity")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub total_quantity: Option<i64>,
}

impl From<UpdateItemRequest> for ItemPatch {
    fn from(body: UpdateItemRequest) -> Self {
        ItemPatch {
            name: body.name,
            category: body.category,
            description: body.description,
            total_quantity: body.total_quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterStaffRequest {
    pub name: Option<String>,
}

impl RegisterStaffRequest {
    pub fn into_new_staff(self) -> Result<NewStaff, axum::response::Response> {
        Ok(NewStaff {
            name: required(self.name, "name")?,
        })
    }
}

/// Unwrap a JSON body, turning extractor rejections into the standard error body.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            rejection.body_text(),
        )),
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, axum::response::Response> {
    value.ok_or_else(|| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            format!("invalid input: {field} is required"),
        )
    })
}

fn quantity(raw: i64) -> Result<Quantity, axum::response::Response> {
    Quantity::new(raw).map_err(errors::domain_error_to_response)
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn item_to_json(item: &InventoryItem) -> serde_json::Value {
    serde_json::json!({
        "id": item.id.get(),
        "name": item.name,
        "category": item.category,
        "description": item.description,
        "total_quantity": item.stock.total(),
        "available_quantity": item.stock.available(),
        "issued_quantity": item.stock.issued(),
        "created_at": item.created_at,
        "updated_at": item.updated_at,
    })
}

pub fn record_to_json(record: &IssueRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.id.get(),
        "item_id": record.item_id.get(),
        "faculty_id": record.staff_id.get(),
        "quantity_issued": record.quantity_issued.get(),
        "status": record.status(),
        "created_at": record.created_at,
        "updated_at": record.updated_at,
    })
}

pub fn entry_to_json(entry: &LedgerEntry) -> serde_json::Value {
    let mut value = record_to_json(&entry.record);
    if let Some(obj) = value.as_object_mut() {
        obj.insert("item_name".to_string(), entry.item_name.clone().into());
        obj.insert("faculty_name".to_string(), entry.staff_name.clone().into());
    }
    value
}

pub fn staff_to_json(staff: &StaffMember) -> serde_json::Value {
    serde_json::json!({
        "id": staff.id.get(),
        "name": staff.name,
        "created_at": staff.created_at,
    })
}

pub fn movement_to_json(movement: &Movement) -> serde_json::Value {
    serde_json::json!({
        "movement_id": movement.movement_id.to_string(),
        "item_id": movement.item_id.get(),
        "faculty_id": movement.staff_id.map(|id| id.get()),
        "record_id": movement.record_id.map(|id| id.get()),
        "kind": movement.kind.as_str(),
        "quantity": movement.quantity,
        "occurred_at": movement.occurred_at,
    })
}
