//! Dashboard entities as exchanged with the REST API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Id = i64;

// ---------------------------------------------------------------------------
// Pagination envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// `{ "data": [...], "meta": { "current_page", "last_page", ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn has_next(&self) -> bool {
        self.meta.current_page < self.meta.last_page
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: Id,
    pub name: String,
    pub cpf: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminInput {
    pub name: String,
    pub cpf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Required on create, optional on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Id,
    pub name: String,
    pub cnpj: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInput {
    pub name: String,
    pub cnpj: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: Id,
    pub name: String,
    pub cpf: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pix_key: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub company_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInput {
    pub name: String,
    pub cpf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pix_key: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Id>,
}

impl Default for WorkerInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            cpf: String::new(),
            phone: None,
            pix_key: None,
            active: true,
            company_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkWorkersInput {
    pub workers: Vec<WorkerInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventAddress {
    pub cep: String,
    pub street: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDay {
    pub id: Id,
    pub date: NaiveDate,
    #[serde(default)]
    pub worker_ids: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub company_id: Option<Id>,
    #[serde(default)]
    pub address: Option<EventAddress>,
    #[serde(default)]
    pub days: Vec<EventDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDayInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub date: NaiveDate,
    #[serde(default)]
    pub worker_ids: Vec<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<EventAddress>,
    #[serde(default)]
    pub days: Vec<EventDayInput>,
}

/// Worker as listed on a specific event day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayWorker {
    pub id: Id,
    pub name: String,
    pub cpf: String,
    #[serde(default)]
    pub company_id: Option<Id>,
}

/// ViaCEP lookup result, with the service's Portuguese field names mapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub cep: String,
    #[serde(rename = "logradouro", default)]
    pub street: String,
    #[serde(rename = "complemento", default)]
    pub complement: String,
    #[serde(rename = "bairro", default)]
    pub neighborhood: String,
    #[serde(rename = "localidade", default)]
    pub city: String,
    #[serde(rename = "uf", default)]
    pub state: String,
}

impl From<Address> for EventAddress {
    fn from(value: Address) -> Self {
        Self {
            cep: value.cep,
            street: value.street,
            number: None,
            neighborhood: Some(value.neighborhood).filter(|n| !n.is_empty()),
            city: value.city,
            state: value.state,
        }
    }
}

// ---------------------------------------------------------------------------
// Worker replacement on an event day
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplacementError {
    #[error("day {0} does not belong to this event")]
    UnknownDay(Id),
    #[error("worker {worker_id} is not assigned to day {day_id}")]
    NotAssigned { day_id: Id, worker_id: Id },
    #[error("worker {worker_id} is already assigned to day {day_id}")]
    AlreadyAssigned { day_id: Id, worker_id: Id },
}

impl From<&Event> for EventInput {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            company_id: event.company_id,
            address: event.address.clone(),
            days: event
                .days
                .iter()
                .map(|day| EventDayInput {
                    id: Some(day.id),
                    date: day.date,
                    worker_ids: day.worker_ids.clone(),
                })
                .collect(),
        }
    }
}

impl Event {
    /// Update payload with `outgoing` swapped for `incoming` on `day_id`,
    /// keeping the slot position.
    pub fn with_replacement(
        &self,
        day_id: Id,
        outgoing: Id,
        incoming: Id,
    ) -> Result<EventInput, ReplacementError> {
        let mut input = EventInput::from(self);
        let day = input
            .days
            .iter_mut()
            .find(|day| day.id == Some(day_id))
            .ok_or(ReplacementError::UnknownDay(day_id))?;

        if day.worker_ids.contains(&incoming) {
            return Err(ReplacementError::AlreadyAssigned {
                day_id,
                worker_id: incoming,
            });
        }
        let slot = day
            .worker_ids
            .iter_mut()
            .find(|id| **id == outgoing)
            .ok_or(ReplacementError::NotAssigned {
                day_id,
                worker_id: outgoing,
            })?;
        *slot = incoming;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn event() -> Event {
        serde_json::from_value(json!({
            "id": 1,
            "name": "Festival",
            "days": [
                { "id": 10, "date": "2026-03-01", "worker_ids": [100, 101, 102] },
                { "id": 11, "date": "2026-03-02", "worker_ids": [100] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_replacement_keeps_slot_and_other_days() {
        let input = event().with_replacement(10, 101, 200).unwrap();
        assert_eq!(input.days[0].worker_ids, vec![100, 200, 102]);
        assert_eq!(input.days[1].worker_ids, vec![100]);
        assert_eq!(input.days[0].id, Some(10));
    }

    #[test]
    fn test_replacement_rejects_inconsistent_requests() {
        let event = event();
        assert_eq!(
            event.with_replacement(99, 100, 200),
            Err(ReplacementError::UnknownDay(99))
        );
        assert_eq!(
            event.with_replacement(11, 101, 200),
            Err(ReplacementError::NotAssigned {
                day_id: 11,
                worker_id: 101
            })
        );
        assert_eq!(
            event.with_replacement(10, 100, 102),
            Err(ReplacementError::AlreadyAssigned {
                day_id: 10,
                worker_id: 102
            })
        );
    }

    #[test]
    fn test_viacep_payload_maps_to_address() {
        let address: Address = serde_json::from_value(json!({
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": "lado ímpar",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP",
            "ibge": "3550308"
        }))
        .unwrap();
        assert_eq!(address.city, "São Paulo");

        let event_address = EventAddress::from(address);
        assert_eq!(event_address.neighborhood.as_deref(), Some("Sé"));
        assert_eq!(event_address.state, "SP");
    }

    #[test]
    fn test_worker_defaults_to_active() {
        let worker: Worker =
            serde_json::from_value(json!({ "id": 5, "name": "João", "cpf": "1" })).unwrap();
        assert!(worker.active);
    }
}
