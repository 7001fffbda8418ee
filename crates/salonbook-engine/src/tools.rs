// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Functions the voice assistant can call while the caller is on the line.
//!
//! The [`BookingTool`] trait is the unified interface for every function;
//! the [`ToolRegistry`] resolves names case- and separator-insensitively,
//! exports definitions for the assistant, and turns every failure into a
//! `{success: false, message}` reply so dispatch itself never fails.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use salonbook_core::{AppointmentStatus, BookingError, BookingStore, NewAppointment};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::availability::AvailabilityEngine;
use crate::display_datetime;
use crate::extraction::{normalize_function_name, parse_datetime};
use crate::resolver::EntityResolver;

#[async_trait]
pub trait BookingTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the argument object.
    fn parameters_schema(&self) -> Value;

    /// Run the function. Expected failures (unknown service, conflict) are
    /// `Ok` replies with `success: false`; `Err` is reserved for store errors.
    async fn invoke(&self, args: Value) -> Result<Value, BookingError>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn BookingTool>>,
    aliases: HashMap<String, String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// The four booking functions over one store.
    pub fn booking_tools(
        store: Arc<dyn BookingStore>,
        resolver: EntityResolver,
        availability: AvailabilityEngine,
        default_hour: u32,
    ) -> Self {
        let ctx = Arc::new(ToolContext {
            store,
            resolver,
            availability,
            default_hour,
        });
        let mut registry = Self::new();
        registry.register(Arc::new(BookAppointment(ctx.clone())));
        registry.register(Arc::new(GetAvailableSlots(ctx.clone())));
        registry.register(Arc::new(GetServices(ctx.clone())));
        registry.register(Arc::new(GetStaff(ctx)));
        registry.alias("getStaffList", "getStaff");
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn BookingTool>) {
        self.tools.insert(normalize_function_name(tool.name()), tool);
    }

    /// Make `alias` resolve to the tool registered as `target`.
    pub fn alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(
            normalize_function_name(alias),
            normalize_function_name(target),
        );
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BookingTool>> {
        let key = normalize_function_name(name);
        let key = self.aliases.get(&key).unwrap_or(&key);
        self.tools.get(key).cloned()
    }

    /// Invoke by name. Unknown names and errors become failure replies.
    pub async fn dispatch(&self, name: &str, args: Value) -> Value {
        let Some(tool) = self.get(name) else {
            warn!(function = name, "unknown function");
            return failure(format!("Function {name} not found"));
        };
        let args = match args {
            Value::Null => json!({}),
            Value::String(text) => serde_json::from_str(&text).unwrap_or_else(|_| json!({})),
            other => other,
        };
        debug!(function = tool.name(), "invoking function");
        match tool.invoke(args).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(function = tool.name(), error = %e, "function failed");
                failure(format!("Error executing {}: {e}", tool.name()))
            }
        }
    }

    /// `{name, description, parameters}` for every tool, sorted by name.
    pub fn definitions(&self) -> Vec<Value> {
        let mut defs: Vec<Value> = self
            .tools
            .values()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "description": t.description(),
                    "parameters": t.parameters_schema(),
                })
            })
            .collect();
        defs.sort_by(|a, b| {
            a["name"]
                .as_str()
                .unwrap_or("")
                .cmp(b["name"].as_str().unwrap_or(""))
        });
        defs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn failure(message: String) -> Value {
    json!({ "success": false, "message": message })
}

struct ToolContext {
    store: Arc<dyn BookingStore>,
    resolver: EntityResolver,
    availability: AvailabilityEngine,
    default_hour: u32,
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)?.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Integer argument given as a JSON number or a numeric string.
fn arg_i64(args: &Value, key: &str) -> Option<i64> {
    match args.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

struct BookAppointment(Arc<ToolContext>);

#[async_trait]
impl BookingTool for BookAppointment {
    fn name(&self) -> &str {
        "bookAppointment"
    }

    fn description(&self) -> &str {
        "Books a salon appointment for a customer."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Customer's name" },
                "date": { "type": "string", "description": "Appointment date/time (YYYY-MM-DDTHH:MM)" },
                "service": {
                    "type": "string",
                    "description": "Service type (Manicure, Hair Coloring, Haircut, Facial, Pedicure, Massage)"
                },
                "staffId": { "type": "number", "description": "Staff member ID" }
            },
            "required": ["name", "date", "service"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, BookingError> {
        let ctx = &self.0;
        let Some(name) = arg_str(&args, "name") else {
            return Ok(failure("Customer name is required".into()));
        };
        let Some(raw_date) = arg_str(&args, "date") else {
            return Ok(failure("Appointment date is required".into()));
        };
        let Some(at) = parse_datetime(raw_date, ctx.default_hour) else {
            return Ok(failure(format!("Invalid appointment date '{raw_date}'")));
        };
        let requested_service = arg_str(&args, "service").unwrap_or_default();

        let customer = ctx.resolver.resolve_customer_by_name(name).await?;

        let Some(service) = ctx.resolver.find_service(requested_service).await? else {
            let catalog = ctx.store.list_services().await?;
            let names: Vec<&str> = catalog.iter().map(|s| s.name.as_str()).collect();
            return Ok(failure(format!(
                "Service '{requested_service}' not found. Available services: {}",
                names.join(", ")
            )));
        };

        let staff = match args.get("staffId").filter(|v| !v.is_null()) {
            Some(raw) => {
                let found = match arg_i64(&args, "staffId") {
                    Some(id) => ctx.store.get_staff(id).await?,
                    None => None,
                };
                match found {
                    Some(staff) => staff,
                    None => {
                        let id = raw.as_str().map_or_else(|| raw.to_string(), str::to_string);
                        return Ok(failure(format!("Staff member with ID {id} not found")));
                    }
                }
            }
            None => ctx.resolver.resolve_staff(at).await?,
        };

        let booked = if ctx.availability.check_conflict(staff.id, at).await? {
            None
        } else {
            ctx.availability
                .book(NewAppointment {
                    customer_id: customer.id,
                    service_id: service.id,
                    staff_id: staff.id,
                    appointment_at: at,
                    status: AppointmentStatus::Pending,
                })
                .await?
        };

        let Some(appointment) = booked else {
            let alternatives = ctx.availability.suggest_alternatives(staff.id, at).await?;
            let mut message = format!(
                "Staff #{} ({}) is already booked at that time. Please choose a different time or staff member.",
                staff.id, staff.name
            );
            if !alternatives.staff.is_empty() {
                let others: Vec<String> = alternatives
                    .staff
                    .iter()
                    .map(|s| format!("{} (#{})", s.name, s.id))
                    .collect();
                message.push_str(&format!(" Available at that time: {}.", others.join(", ")));
            }
            if !alternatives.times.is_empty() {
                let times: Vec<String> = alternatives
                    .times
                    .iter()
                    .map(|t| t.format("%-I:%M %p").to_string())
                    .collect();
                message.push_str(&format!(
                    " {} is free at: {}.",
                    staff.name,
                    times.join(", ")
                ));
            }
            return Ok(json!({
                "success": false,
                "message": message,
                "alternatives": alternatives,
            }));
        };

        Ok(json!({
            "success": true,
            "message": format!(
                "Appointment booked for {} on {} for {} ({}) with {}.",
                customer.name,
                display_datetime(appointment.appointment_at),
                service.name,
                format_price(service.price),
                staff.name
            ),
            "appointmentId": appointment.id,
            "price": service.price,
            "duration": service.duration,
        }))
    }
}

struct GetAvailableSlots(Arc<ToolContext>);

#[async_trait]
impl BookingTool for GetAvailableSlots {
    fn name(&self) -> &str {
        "getAvailableSlots"
    }

    fn description(&self) -> &str {
        "Lists open time slots for a given day and optional staff member."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": { "type": "string", "description": "Date to check (YYYY-MM-DD)" },
                "staffId": { "type": "number", "description": "Optional staff member ID" }
            },
            "required": ["date"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, BookingError> {
        let Some(raw_date) = arg_str(&args, "date") else {
            return Ok(failure("Date is required".into()));
        };
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_datetime(raw_date, 0).map(|dt| dt.date()));
        let Some(date) = date else {
            return Ok(failure(format!("Invalid date '{raw_date}': expected YYYY-MM-DD")));
        };
        let staff_id = arg_i64(&args, "staffId");

        let mut slots = self.0.availability.list_available(Some(date), staff_id).await?;
        slots.sort_by_key(|s| (s.slot.start_time, s.staff.id));

        if slots.is_empty() {
            let suffix = staff_id.map_or_else(String::new, |id| format!(" for staff #{id}"));
            return Ok(json!({
                "success": true,
                "message": format!("No available slots found for {date}{suffix}"),
                "availableSlots": [],
            }));
        }

        let formatted: Vec<Value> = slots
            .iter()
            .map(|s| {
                json!({
                    "slotId": s.slot.id,
                    "time": format!(
                        "{} - {}",
                        s.slot.start_time.format("%H:%M"),
                        s.slot.end_time.format("%H:%M")
                    ),
                    "staff": format!("{} ({})", s.staff.name, s.staff.role),
                    "staffId": s.staff.id,
                })
            })
            .collect();
        Ok(json!({
            "success": true,
            "totalSlots": formatted.len(),
            "availableSlots": formatted,
            "date": date.to_string(),
        }))
    }
}

struct GetServices(Arc<ToolContext>);

#[async_trait]
impl BookingTool for GetServices {
    fn name(&self) -> &str {
        "getServices"
    }

    fn description(&self) -> &str {
        "Get all available services with prices and durations"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, _args: Value) -> Result<Value, BookingError> {
        let mut services = self.0.store.list_services().await?;
        services.sort_by(|a, b| a.name.cmp(&b.name));
        let services: Vec<Value> = services
            .into_iter()
            .map(|s| {
                json!({
                    "id": s.id,
                    "name": s.name,
                    "description": s.description,
                    "duration": format!("{} minutes", s.duration),
                    "price": format_price(s.price),
                })
            })
            .collect();
        Ok(json!({ "success": true, "services": services }))
    }
}

struct GetStaff(Arc<ToolContext>);

#[async_trait]
impl BookingTool for GetStaff {
    fn name(&self) -> &str {
        "getStaff"
    }

    fn description(&self) -> &str {
        "Get all available staff members"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn invoke(&self, _args: Value) -> Result<Value, BookingError> {
        let mut staff = self.0.store.list_staff().await?;
        staff.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(json!({ "success": true, "staff": staff }))
    }
}
