//! Tickets de support ouverts par les utilisateurs

use chrono::NaiveDateTime;
use log::info;
use serde::{Deserialize, Serialize};

use super::{now, Record, Store, StoreError};
use crate::{consts, models::TicketStatus};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SupportTicket {
    pub id: u64,
    pub user_id: u64,
    pub user_name: String,
    pub user_email: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub status: TicketStatus,
    pub created_at: NaiveDateTime,
}

impl Record for SupportTicket {
    const FILE: &'static str = consts::SUPPORT_TICKETS_FILE;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Clone, Debug)]
pub struct NewSupportTicket {
    pub user_id: u64,
    pub user_name: String,
    pub user_email: String,
    pub category: String,
    pub description: String,
    pub language: String,
}

impl Store {
    pub fn add_support_ticket(&self, new: NewSupportTicket) -> Result<SupportTicket, StoreError> {
        let ticket = self.insert(|id| SupportTicket {
            id,
            user_id: new.user_id,
            user_name: new.user_name,
            user_email: new.user_email,
            category: new.category,
            description: new.description,
            language: new.language,
            status: TicketStatus::Open,
            created_at: now(),
        })?;
        info!("Support ticket {} opened by user {}", ticket.id, ticket.user_id);
        Ok(ticket)
    }

    pub fn get_support_tickets(&self, user_id: Option<u64>) -> Result<Vec<SupportTicket>, StoreError> {
        self.filter(|t: &SupportTicket| user_id.map_or(true, |uid| t.user_id == uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tests::temp_store;

    #[test]
    fn test_ticket_is_open_and_scoped_to_user() {
        let (_dir, store) = temp_store();
        let ticket = store
            .add_support_ticket(NewSupportTicket {
                user_id: 3,
                user_name: "Lakshmi".into(),
                user_email: "lakshmi@example.com".into(),
                category: "Technical".into(),
                description: "Audio upload fails".into(),
                language: "தமிழ் (Tamil)".into(),
            })
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(store.get_support_tickets(Some(3)).unwrap(), vec![ticket]);
        assert!(store.get_support_tickets(Some(4)).unwrap().is_empty());
    }
}
