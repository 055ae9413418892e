//! Modèle de données partagé

use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

/// Rôle d'un utilisateur: Patient ou Médecin
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display,
)]
pub enum Role {
    Patient,
    Doctor,
}

/// État d'un rendez-vous
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

/// État d'un rappel
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ReminderStatus {
    #[default]
    Pending,
    Sent,
    Cancelled,
}

/// État d'un traitement médicamenteux
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum MedicationStatus {
    #[default]
    Active,
    Completed,
    Discontinued,
}

/// État d'un ticket de support
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum TicketStatus {
    #[default]
    Open,
    #[display("In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

/// Type de rappel
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, EnumIter, Display)]
pub enum ReminderType {
    #[default]
    Medication,
    Appointment,
    #[display("Follow-up")]
    #[serde(rename = "Follow-up")]
    FollowUp,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("Doctor").unwrap(), Role::Doctor);
        assert_eq!(Role::from_str("Patient").unwrap(), Role::Patient);
        assert!(Role::from_str("Admin").is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(
            serde_json::from_str::<ReminderType>("\"Follow-up\"").unwrap(),
            ReminderType::FollowUp
        );
        assert_eq!(AppointmentStatus::default().to_string(), "Scheduled");
    }
}
