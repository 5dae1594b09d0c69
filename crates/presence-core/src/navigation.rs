//! Session state and page routing.
//!
//! `Dashboard` and `Register` are intents whose concrete page depends on the
//! selected role and login state; every other page passes straight through.

use crate::types::{Page, Role, StudentProfile};
use serde::Serialize;

/// Process-wide UI session. Only the methods below mutate it.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    current_page: Page,
    user_role: Option<Role>,
    is_authenticated: bool,
    authenticated_student: Option<StudentProfile>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            current_page: Page::UserSelect,
            user_role: None,
            is_authenticated: false,
            authenticated_student: None,
        }
    }

    pub fn current_page(&self) -> Page {
        self.current_page
    }

    pub fn user_role(&self) -> Option<Role> {
        self.user_role
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn authenticated_student(&self) -> Option<&StudentProfile> {
        self.authenticated_student.as_ref()
    }

    /// Record the chosen role and land on the home page.
    pub fn select_role(&mut self, role: Role) {
        tracing::debug!(%role, "role selected");
        self.user_role = Some(role);
        self.current_page = Page::Home;
    }

    /// Resolve an intent to a concrete page and switch to it.
    ///
    /// Returns the page in effect afterwards. Role-dependent intents are a
    /// no-op while no role has been selected.
    pub fn request_navigation(&mut self, intent: Page) -> Page {
        if let Some(page) = self.resolve(intent) {
            tracing::debug!(%intent, %page, "navigate");
            self.current_page = page;
        } else {
            tracing::debug!(%intent, "navigation ignored: no role selected");
        }
        self.current_page
    }

    /// Page an intent would resolve to, without navigating.
    pub fn resolve(&self, intent: Page) -> Option<Page> {
        match intent {
            Page::Dashboard => match self.user_role? {
                Role::Admin => Some(Page::Dashboard),
                Role::Student if self.is_authenticated => Some(Page::StudentDashboard),
                Role::Student => Some(Page::StudentLogin),
            },
            Page::Register => match self.user_role? {
                Role::Admin => Some(Page::AdminRegister),
                Role::Student => Some(Page::StudentRegister),
            },
            other => Some(other),
        }
    }

    /// Mark the student as logged in and open their dashboard.
    pub fn complete_login(&mut self, student: StudentProfile) {
        tracing::info!(enrollment_id = %student.enrollment_id, "student logged in");
        self.is_authenticated = true;
        self.authenticated_student = Some(student);
        self.current_page = Page::StudentDashboard;
    }

    /// Forget role and login and return to the user-selection screen.
    pub fn sign_out(&mut self) {
        tracing::debug!("session reset");
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Directory;

    fn drishti() -> StudentProfile {
        Directory::demo().profile("CS2021002").unwrap().clone()
    }

    #[test]
    fn test_initial_state() {
        let s = Session::new();
        assert_eq!(s.current_page(), Page::UserSelect);
        assert_eq!(s.user_role(), None);
        assert!(!s.is_authenticated());
        assert!(s.authenticated_student().is_none());
    }

    #[test]
    fn test_select_role_goes_home() {
        for role in [Role::Admin, Role::Student] {
            let mut s = Session::new();
            s.select_role(role);
            assert_eq!(s.current_page(), Page::Home);
            assert_eq!(s.user_role(), Some(role));
        }
    }

    #[test]
    fn test_student_dashboard_requires_login() {
        let mut s = Session::new();
        s.select_role(Role::Student);
        assert_eq!(s.request_navigation(Page::Dashboard), Page::StudentLogin);

        s.complete_login(drishti());
        s.request_navigation(Page::Home);
        assert_eq!(s.request_navigation(Page::Dashboard), Page::StudentDashboard);
    }

    #[test]
    fn test_admin_dashboard_ignores_auth() {
        let mut s = Session::new();
        s.select_role(Role::Admin);
        assert_eq!(s.request_navigation(Page::Dashboard), Page::Dashboard);

        s.complete_login(drishti());
        s.select_role(Role::Admin);
        assert!(s.is_authenticated());
        assert_eq!(s.request_navigation(Page::Dashboard), Page::Dashboard);
    }

    #[test]
    fn test_register_resolves_by_role() {
        let mut s = Session::new();
        s.select_role(Role::Admin);
        assert_eq!(s.request_navigation(Page::Register), Page::AdminRegister);

        s.select_role(Role::Student);
        assert_eq!(s.request_navigation(Page::Register), Page::StudentRegister);
    }

    #[test]
    fn test_role_intents_are_noop_without_role() {
        let mut s = Session::new();
        assert_eq!(s.request_navigation(Page::Dashboard), Page::UserSelect);
        assert_eq!(s.request_navigation(Page::Register), Page::UserSelect);
    }

    #[test]
    fn test_other_pages_pass_through() {
        let mut s = Session::new();
        s.select_role(Role::Student);
        for page in [
            Page::Home,
            Page::Attendance,
            Page::StudentLogin,
            Page::UserSelect,
            Page::AdminRegister,
        ] {
            assert_eq!(s.request_navigation(page), page);
        }
        // Pass-through to user-select keeps the role.
        assert_eq!(s.user_role(), Some(Role::Student));
    }

    #[test]
    fn test_complete_login_attaches_profile() {
        let mut s = Session::new();
        s.select_role(Role::Student);
        s.complete_login(drishti());
        assert!(s.is_authenticated());
        assert_eq!(s.current_page(), Page::StudentDashboard);
        assert_eq!(s.authenticated_student().unwrap().name, "Drishti Butani");
    }

    #[test]
    fn test_sign_out_resets_everything() {
        let mut s = Session::new();
        s.select_role(Role::Student);
        s.complete_login(drishti());
        s.sign_out();
        assert_eq!(s.current_page(), Page::UserSelect);
        assert_eq!(s.user_role(), None);
        assert!(!s.is_authenticated());
    }
}
