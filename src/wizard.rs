//! Booking wizard state machine.
//!
//! The five-step flow (`Service → Device → Contact → Schedule →
//! Confirmation`) lives here as a pure transition function so the branching
//! rules can be tested without a request in sight. The only branch in the
//! machine is at `Device`: an unauthenticated visitor is sent to `Contact`
//! (the login hand-off) while an authenticated one skips straight to
//! `Schedule`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Service,
    Device,
    Contact,
    Schedule,
    Confirmation,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::Service => 1,
            Step::Device => 2,
            Step::Contact => 3,
            Step::Schedule => 4,
            Step::Confirmation => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Next,
    Back,
    SubmitSucceeded,
    SubmitFailed,
    BookAnother,
}

/// What the visitor has filled in so far, plus whether a session exists.
/// Guards read this; the machine itself never mutates it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    pub service_chosen: bool,
    pub device_chosen: bool,
    pub schedule_chosen: bool,
    pub authenticated: bool,
}

/// Entry point for the wizard. A deep link that pre-selects a device model
/// starts on the device step with category/brand back-filled by reverse
/// lookup; everything else starts at service selection.
pub fn initial_step(preselected_device: bool) -> Step {
    if preselected_device {
        Step::Device
    } else {
        Step::Service
    }
}

/// Total transition function. Unmet guards hold the machine in place rather
/// than failing, mirroring a form that refuses to advance.
pub fn transition(step: Step, event: Event, progress: &Progress) -> Step {
    match (step, event) {
        (Step::Service, Event::Next) if progress.service_chosen => Step::Device,
        (Step::Service, _) => Step::Service,

        (Step::Device, Event::Next) if progress.device_chosen => {
            if progress.authenticated {
                Step::Schedule
            } else {
                Step::Contact
            }
        }
        (Step::Device, Event::Back) => Step::Service,
        (Step::Device, _) => Step::Device,

        // Contact collects nothing itself; it hands off to the login surface
        // and resumes once a session exists.
        (Step::Contact, Event::Next) if progress.authenticated => Step::Schedule,
        (Step::Contact, Event::Back) => Step::Device,
        (Step::Contact, _) => Step::Contact,

        (Step::Schedule, Event::SubmitSucceeded) if progress.schedule_chosen => Step::Confirmation,
        (Step::Schedule, Event::Back) => {
            if progress.authenticated {
                Step::Device
            } else {
                Step::Contact
            }
        }
        (Step::Schedule, _) => Step::Schedule,

        (Step::Confirmation, Event::BookAnother) => Step::Service,
        (Step::Confirmation, _) => Step::Confirmation,
    }
}

/// The transient form state carried through the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingDraft {
    pub service_label: String,
    pub device_category: String,
    pub device_brand: String,
    pub device_model: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

impl BookingDraft {
    pub fn progress(&self, authenticated: bool) -> Progress {
        Progress {
            service_chosen: !self.service_label.trim().is_empty(),
            device_chosen: !self.device_category.trim().is_empty()
                && !self.device_brand.trim().is_empty()
                && !self.device_model.trim().is_empty(),
            schedule_chosen: !self.appointment_date.trim().is_empty()
                && !self.appointment_time.trim().is_empty(),
            authenticated,
        }
    }

    /// "Book another device": clear everything except the identity-derived
    /// contact fields, which survive as long as the session does.
    pub fn reset_for_next_booking(&mut self, authenticated: bool) {
        let keep = if authenticated {
            Some((
                self.customer_name.clone(),
                self.customer_email.clone(),
                self.customer_phone.clone(),
            ))
        } else {
            None
        };
        *self = BookingDraft::default();
        if let Some((name, email, phone)) = keep {
            self.customer_name = name;
            self.customer_email = email;
            self.customer_phone = phone;
        }
    }
}

/// Replay the wizard from its first step against a finished draft. Returns
/// the step the visitor would be stranded on, or `Schedule` once every guard
/// up to submission holds.
pub fn walk_to_submission(draft: &BookingDraft, authenticated: bool) -> Step {
    let progress = draft.progress(authenticated);
    let mut step = initial_step(false);
    for _ in 0..3 {
        let next = transition(step, Event::Next, &progress);
        if next == step {
            break;
        }
        step = next;
    }
    step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> BookingDraft {
        BookingDraft {
            service_label: "Screen Repair".into(),
            device_category: "Phone".into(),
            device_brand: "Apple".into(),
            device_model: "iPhone 15".into(),
            appointment_date: "2025-06-01".into(),
            appointment_time: "10:00 AM".into(),
            customer_name: "Sam Doe".into(),
            customer_email: "user@example.com".into(),
            customer_phone: "555-0101".into(),
        }
    }

    #[test]
    fn empty_service_keeps_step_one() {
        let progress = Progress::default();
        assert_eq!(transition(Step::Service, Event::Next, &progress), Step::Service);
    }

    #[test]
    fn authenticated_flow_never_shows_contact() {
        let progress = full_draft().progress(true);
        let mut step = initial_step(false);
        let mut visited = vec![step];
        loop {
            let next = transition(step, Event::Next, &progress);
            if next == step {
                break;
            }
            step = next;
            visited.push(step);
        }
        assert!(!visited.contains(&Step::Contact));
        assert_eq!(step, Step::Schedule);
    }

    #[test]
    fn unauthenticated_device_next_lands_on_contact() {
        let progress = full_draft().progress(false);
        assert_eq!(transition(Step::Device, Event::Next, &progress), Step::Contact);
    }

    #[test]
    fn contact_resumes_to_schedule_after_login() {
        let not_yet = full_draft().progress(false);
        assert_eq!(transition(Step::Contact, Event::Next, &not_yet), Step::Contact);
        let logged_in = full_draft().progress(true);
        assert_eq!(transition(Step::Contact, Event::Next, &logged_in), Step::Schedule);
    }

    #[test]
    fn back_from_schedule_depends_on_session() {
        let progress = full_draft().progress(true);
        assert_eq!(transition(Step::Schedule, Event::Back, &progress), Step::Device);
        let progress = full_draft().progress(false);
        assert_eq!(transition(Step::Schedule, Event::Back, &progress), Step::Contact);
    }

    #[test]
    fn failed_submit_stays_on_schedule() {
        let progress = full_draft().progress(true);
        assert_eq!(
            transition(Step::Schedule, Event::SubmitFailed, &progress),
            Step::Schedule
        );
    }

    #[test]
    fn empty_schedule_cannot_confirm() {
        let mut draft = full_draft();
        draft.appointment_time.clear();
        let progress = draft.progress(true);
        assert_eq!(
            transition(Step::Schedule, Event::SubmitSucceeded, &progress),
            Step::Schedule
        );
    }

    #[test]
    fn successful_submit_confirms_then_resets_to_service() {
        let progress = full_draft().progress(true);
        let step = transition(Step::Schedule, Event::SubmitSucceeded, &progress);
        assert_eq!(step, Step::Confirmation);
        assert_eq!(transition(step, Event::BookAnother, &progress), Step::Service);
    }

    #[test]
    fn deep_link_starts_on_device_step() {
        assert_eq!(initial_step(true), Step::Device);
        assert_eq!(initial_step(false), Step::Service);
    }

    #[test]
    fn reset_keeps_identity_fields_while_authenticated() {
        let mut draft = full_draft();
        draft.reset_for_next_booking(true);
        assert_eq!(draft.customer_email, "user@example.com");
        assert_eq!(draft.customer_name, "Sam Doe");
        assert!(draft.service_label.is_empty());
        assert!(draft.appointment_time.is_empty());
    }

    #[test]
    fn reset_clears_everything_when_signed_out() {
        let mut draft = full_draft();
        draft.reset_for_next_booking(false);
        assert_eq!(draft, BookingDraft::default());
    }

    #[test]
    fn walk_strands_unauthenticated_visitor_on_contact() {
        assert_eq!(walk_to_submission(&full_draft(), false), Step::Contact);
        assert_eq!(walk_to_submission(&full_draft(), true), Step::Schedule);
    }

    #[test]
    fn walk_strands_missing_service_on_step_one() {
        let mut draft = full_draft();
        draft.service_label.clear();
        assert_eq!(walk_to_submission(&draft, true), Step::Service);
    }
}
