//! Multi-step registration wizards for students and administrators.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BRANCHES: &[&str] = &[
    "Computer Science Engineering",
    "Electronics & Communication Engineering",
    "Mechanical Engineering",
    "Civil Engineering",
    "Electrical Engineering",
    "Information Technology",
    "Chemical Engineering",
    "Biotechnology",
];

pub const YEARS: &[&str] = &["1st Year", "2nd Year", "3rd Year", "4th Year"];

pub const SECTIONS: &[&str] = &["A", "B", "C", "D"];

pub const DEPARTMENTS: &[&str] = &[
    "Computer Science & Engineering",
    "Electronics & Communication",
    "Mechanical Engineering",
    "Civil Engineering",
    "Information Technology",
    "Administration",
    "Academic Affairs",
    "Student Affairs",
    "Human Resources",
    "Finance & Accounts",
];

pub const POSITIONS: &[&str] = &[
    "Professor",
    "Associate Professor",
    "Assistant Professor",
    "Head of Department",
    "Dean",
    "Registrar",
    "Admin Officer",
    "IT Administrator",
    "Security Officer",
    "System Administrator",
];

pub const ACCESS_LEVELS: &[&str] = &[
    "Super Admin",
    "Department Admin",
    "Faculty Admin",
    "Support Admin",
    "Read Only Admin",
];

pub const SECURITY_QUESTIONS: &[&str] = &[
    "What was the name of your first pet?",
    "What city were you born in?",
    "What is your mother's maiden name?",
    "What was your first job?",
    "What is your favorite movie?",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Please fill in all required fields")]
    IncompleteStep { step: u8 },
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("{value:?} is not a valid {field}")]
    NotAnOption {
        field: &'static str,
        value: String,
    },
}

/// A form filled in over a fixed number of steps.
pub trait WizardForm: Default {
    const TOTAL_STEPS: u8;
    /// Notification shown once the form is submitted.
    const SUCCESS_MESSAGE: &'static str;

    /// Whether every required field of `step` is filled in.
    fn step_complete(&self, step: u8) -> bool;

    /// Set a field by its form name.
    fn set(&mut self, field: &str, value: String) -> Result<(), RegistrationError>;

    /// Field names and current values shown on `step`.
    fn step_fields(&self, step: u8) -> Vec<(&'static str, &str)>;

    /// Allowed values of a select field; `None` for free-text fields.
    fn options(field: &str) -> Option<(&'static str, &'static [&'static str])>;
}

fn filled(fields: &[&str]) -> bool {
    fields.iter().all(|f| !f.is_empty())
}

/// Canonical spelling of `value` for a select field, matched case-insensitively.
fn pick<F: WizardForm>(field: &str, value: String) -> Result<String, RegistrationError> {
    match F::options(field) {
        None => Ok(value),
        Some((name, options)) => options
            .iter()
            .find(|o| o.eq_ignore_ascii_case(value.trim()))
            .map(|o| o.to_string())
            .ok_or(RegistrationError::NotAnOption { field: name, value }),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentForm {
    pub first_name: String,
    pub last_name: String,
    pub enrollment_id: String,
    pub email: String,
    pub phone: String,
    pub branch: String,
    pub year: String,
    pub section: String,
    pub date_of_birth: String,
    pub address: String,
    pub guardian_name: String,
    pub guardian_phone: String,
    pub photo: Option<String>,
}

impl WizardForm for StudentForm {
    const TOTAL_STEPS: u8 = 3;
    const SUCCESS_MESSAGE: &'static str = "Student registration successful!";

    fn step_complete(&self, step: u8) -> bool {
        match step {
            1 => filled(&[
                self.first_name.as_str(),
                self.last_name.as_str(),
                self.enrollment_id.as_str(),
                self.email.as_str(),
            ]),
            2 => filled(&[
                self.branch.as_str(),
                self.year.as_str(),
                self.section.as_str(),
                self.date_of_birth.as_str(),
            ]),
            3 => filled(&[
                self.guardian_name.as_str(),
                self.guardian_phone.as_str(),
                self.address.as_str(),
            ]),
            _ => false,
        }
    }

    fn set(&mut self, field: &str, value: String) -> Result<(), RegistrationError> {
        let value = pick::<Self>(field, value)?;
        let slot = match field {
            "first-name" => &mut self.first_name,
            "last-name" => &mut self.last_name,
            "enrollment-id" => &mut self.enrollment_id,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "branch" => &mut self.branch,
            "year" => &mut self.year,
            "section" => &mut self.section,
            "date-of-birth" => &mut self.date_of_birth,
            "address" => &mut self.address,
            "guardian-name" => &mut self.guardian_name,
            "guardian-phone" => &mut self.guardian_phone,
            "photo" => {
                self.photo = Some(value);
                return Ok(());
            }
            other => return Err(RegistrationError::UnknownField(other.to_string())),
        };
        *slot = value;
        Ok(())
    }

    fn step_fields(&self, step: u8) -> Vec<(&'static str, &str)> {
        match step {
            1 => vec![
                ("first-name", self.first_name.as_str()),
                ("last-name", self.last_name.as_str()),
                ("enrollment-id", self.enrollment_id.as_str()),
                ("email", self.email.as_str()),
                ("phone", self.phone.as_str()),
            ],
            2 => vec![
                ("branch", self.branch.as_str()),
                ("year", self.year.as_str()),
                ("section", self.section.as_str()),
                ("date-of-birth", self.date_of_birth.as_str()),
            ],
            3 => vec![
                ("guardian-name", self.guardian_name.as_str()),
                ("guardian-phone", self.guardian_phone.as_str()),
                ("address", self.address.as_str()),
                ("photo", self.photo.as_deref().unwrap_or("")),
            ],
            _ => Vec::new(),
        }
    }

    fn options(field: &str) -> Option<(&'static str, &'static [&'static str])> {
        match field {
            "branch" => Some(("branch", BRANCHES)),
            "year" => Some(("year", YEARS)),
            "section" => Some(("section", SECTIONS)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub employee_id: String,
    pub department: String,
    pub position: String,
    pub access_level: String,
    pub security_question: String,
    pub security_answer: String,
    pub emergency_contact: String,
    pub emergency_phone: String,
    pub photo: Option<String>,
}

impl WizardForm for AdminForm {
    const TOTAL_STEPS: u8 = 4;
    const SUCCESS_MESSAGE: &'static str = "Admin registration successful!";

    fn step_complete(&self, step: u8) -> bool {
        match step {
            1 => filled(&[
                self.first_name.as_str(),
                self.last_name.as_str(),
                self.email.as_str(),
                self.phone.as_str(),
            ]),
            2 => filled(&[
                self.employee_id.as_str(),
                self.department.as_str(),
                self.position.as_str(),
            ]),
            3 => filled(&[
                self.access_level.as_str(),
                self.security_question.as_str(),
                self.security_answer.as_str(),
            ]),
            4 => filled(&[
                self.emergency_contact.as_str(),
                self.emergency_phone.as_str(),
            ]),
            _ => false,
        }
    }

    fn set(&mut self, field: &str, value: String) -> Result<(), RegistrationError> {
        let value = pick::<Self>(field, value)?;
        let slot = match field {
            "first-name" => &mut self.first_name,
            "last-name" => &mut self.last_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "employee-id" => &mut self.employee_id,
            "department" => &mut self.department,
            "position" => &mut self.position,
            "access-level" => &mut self.access_level,
            "security-question" => &mut self.security_question,
            "security-answer" => &mut self.security_answer,
            "emergency-contact" => &mut self.emergency_contact,
            "emergency-phone" => &mut self.emergency_phone,
            "photo" => {
                self.photo = Some(value);
                return Ok(());
            }
            other => return Err(RegistrationError::UnknownField(other.to_string())),
        };
        *slot = value;
        Ok(())
    }

    fn step_fields(&self, step: u8) -> Vec<(&'static str, &str)> {
        match step {
            1 => vec![
                ("first-name", self.first_name.as_str()),
                ("last-name", self.last_name.as_str()),
                ("email", self.email.as_str()),
                ("phone", self.phone.as_str()),
            ],
            2 => vec![
                ("employee-id", self.employee_id.as_str()),
                ("department", self.department.as_str()),
                ("position", self.position.as_str()),
                ("photo", self.photo.as_deref().unwrap_or("")),
            ],
            3 => vec![
                ("access-level", self.access_level.as_str()),
                ("security-question", self.security_question.as_str()),
                ("security-answer", self.security_answer.as_str()),
            ],
            4 => vec![
                ("emergency-contact", self.emergency_contact.as_str()),
                ("emergency-phone", self.emergency_phone.as_str()),
            ],
            _ => Vec::new(),
        }
    }

    fn options(field: &str) -> Option<(&'static str, &'static [&'static str])> {
        match field {
            "department" => Some(("department", DEPARTMENTS)),
            "position" => Some(("position", POSITIONS)),
            "access-level" => Some(("access-level", ACCESS_LEVELS)),
            "security-question" => Some(("security-question", SECURITY_QUESTIONS)),
            _ => None,
        }
    }
}

/// Step cursor over a [`WizardForm`].
#[derive(Debug, Clone, Default)]
pub struct Wizard<F: WizardForm> {
    pub form: F,
    step: u8,
}

impl<F: WizardForm> Wizard<F> {
    pub fn new() -> Self {
        Self {
            form: F::default(),
            step: 1,
        }
    }

    pub fn step(&self) -> u8 {
        self.step.max(1)
    }

    pub fn is_last_step(&self) -> bool {
        self.step() == F::TOTAL_STEPS
    }

    /// Advance one step if the current one is complete.
    pub fn next(&mut self) -> Result<u8, RegistrationError> {
        self.check_current()?;
        self.step = (self.step() + 1).min(F::TOTAL_STEPS);
        Ok(self.step)
    }

    pub fn previous(&mut self) -> u8 {
        self.step = self.step().saturating_sub(1).max(1);
        self.step
    }

    /// Validate the current step before handing the form off.
    pub fn submit(&self) -> Result<&F, RegistrationError> {
        self.check_current()?;
        Ok(&self.form)
    }

    /// Clear the form and return to step 1.
    pub fn reset(&mut self) {
        self.form = F::default();
        self.step = 1;
    }

    fn check_current(&self) -> Result<(), RegistrationError> {
        let step = self.step();
        if self.form.step_complete(step) {
            Ok(())
        } else {
            tracing::debug!(step, "wizard step incomplete");
            Err(RegistrationError::IncompleteStep { step })
        }
    }
}
