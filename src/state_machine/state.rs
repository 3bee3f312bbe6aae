//! Form session types

use crate::checklist::CheckedItems;
use crate::submission::SubmissionRecord;
use std::fmt;

/// Where a session is in the form, in strict linear order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormState {
    #[default]
    AwaitingSurname,
    AwaitingRoom,
    AwaitingStudio,
    AwaitingDate,
    AwaitingBattery,
    AwaitingChecklist,
    AwaitingConfirmation,
}

impl FormState {
    /// All states in the order a session walks through them
    #[allow(dead_code)] // Used in tests
    pub const ORDER: [FormState; 7] = [
        FormState::AwaitingSurname,
        FormState::AwaitingRoom,
        FormState::AwaitingStudio,
        FormState::AwaitingDate,
        FormState::AwaitingBattery,
        FormState::AwaitingChecklist,
        FormState::AwaitingConfirmation,
    ];

    /// Zero-based position in [`FormState::ORDER`]
    #[allow(dead_code)] // Used in tests
    pub fn position(self) -> usize {
        match self {
            FormState::AwaitingSurname => 0,
            FormState::AwaitingRoom => 1,
            FormState::AwaitingStudio => 2,
            FormState::AwaitingDate => 3,
            FormState::AwaitingBattery => 4,
            FormState::AwaitingChecklist => 5,
            FormState::AwaitingConfirmation => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormState::AwaitingSurname => "awaiting_surname",
            FormState::AwaitingRoom => "awaiting_room",
            FormState::AwaitingStudio => "awaiting_studio",
            FormState::AwaitingDate => "awaiting_date",
            FormState::AwaitingBattery => "awaiting_battery",
            FormState::AwaitingChecklist => "awaiting_checklist",
            FormState::AwaitingConfirmation => "awaiting_confirmation",
        }
    }
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text fields collected by the prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Surname,
    Room,
    Studio,
    Date,
    Battery,
}

/// Collected answers. A field is `None` until its prompt has been answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub surname: Option<String>,
    pub room: Option<String>,
    pub studio: Option<String>,
    pub date: Option<String>,
    pub battery: Option<String>,
}

impl FormFields {
    pub fn set(&mut self, field: FormField, value: String) {
        let slot = match field {
            FormField::Surname => &mut self.surname,
            FormField::Room => &mut self.room,
            FormField::Studio => &mut self.studio,
            FormField::Date => &mut self.date,
            FormField::Battery => &mut self.battery,
        };
        *slot = Some(value);
    }

    #[allow(dead_code)] // Used in tests
    pub fn get(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Surname => self.surname.as_deref(),
            FormField::Room => self.room.as_deref(),
            FormField::Studio => self.studio.as_deref(),
            FormField::Date => self.date.as_deref(),
            FormField::Battery => self.battery.as_deref(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        *self == FormFields::default()
    }
}

/// One user's in-progress form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: FormState,
    pub fields: FormFields,
    pub checked: CheckedItems,
    /// Rendered checklist, set when the checklist is confirmed
    pub checklist_snapshot: Option<String>,
}

impl Session {
    /// Fresh session at the first prompt with nothing collected
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the report for this session.
    ///
    /// Returns `None` while any field or the checklist snapshot is missing.
    pub fn submission_record(&self) -> Option<SubmissionRecord> {
        Some(SubmissionRecord {
            surname: self.fields.surname.clone()?,
            room: self.fields.room.clone()?,
            studio: self.fields.studio.clone()?,
            date: self.fields.date.clone()?,
            battery: self.fields.battery.clone()?,
            checklist: self.checklist_snapshot.clone()?,
        })
    }
}
