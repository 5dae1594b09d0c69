//! Mock backend calls: fixed artificial latency around core logic.

use presence_core::registration::{AdminForm, RegistrationError, StudentForm, Wizard, WizardForm};
use presence_core::{
    IdentityStore, LockoutPolicy, LoginError, LoginGate, Page, Session, StudentProfile,
};
use std::time::Duration;

fn now() -> std::time::Instant {
    // Follows tokio's clock so a paused test runtime controls lockout expiry.
    tokio::time::Instant::now().into_std()
}

/// Simulated login endpoint.
pub struct LoginService<S> {
    store: S,
    gate: LoginGate,
    delay: Duration,
}

impl<S: IdentityStore> LoginService<S> {
    pub fn new(store: S, policy: LockoutPolicy, delay: Duration) -> Self {
        Self {
            store,
            gate: LoginGate::new(policy),
            delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.gate.attempts()
    }

    /// Validate, wait out the simulated round trip, then check credentials.
    ///
    /// Form errors and an active lock are reported without the delay.
    pub async fn login(
        &mut self,
        enrollment_id: &str,
        password: &str,
    ) -> Result<StudentProfile, LoginError> {
        LoginGate::validate(enrollment_id, password)?;
        if self.gate.is_locked(now()) {
            return Err(LoginError::Locked);
        }

        tokio::time::sleep(self.delay).await;
        self.gate.attempt(&self.store, enrollment_id, password, now())
    }

    /// Log in and, on success, hand the profile to the session.
    pub async fn login_into(
        &mut self,
        session: &mut Session,
        enrollment_id: &str,
        password: &str,
    ) -> Result<String, LoginError> {
        let profile = self.login(enrollment_id, password).await?;
        let welcome = format!("Welcome back, {}!", profile.name);
        session.complete_login(profile);
        Ok(welcome)
    }
}

/// Simulated registration endpoint.
pub struct RegistrationService {
    delay: Duration,
    hold: Duration,
}

impl RegistrationService {
    pub fn new(delay: Duration, hold: Duration) -> Self {
        Self { delay, hold }
    }

    /// Validate the current step and wait out the simulated submit.
    pub async fn submit<F: WizardForm>(
        &self,
        wizard: &Wizard<F>,
    ) -> Result<&'static str, RegistrationError> {
        wizard.submit()?;
        tokio::time::sleep(self.delay).await;
        tracing::info!(form = std::any::type_name::<F>(), "registration submitted");
        Ok(F::SUCCESS_MESSAGE)
    }

    /// Submit a student form, keep the success screen up, then start over.
    pub async fn register_student(
        &self,
        wizard: &mut Wizard<StudentForm>,
    ) -> Result<&'static str, RegistrationError> {
        let message = self.submit(wizard).await?;
        tokio::time::sleep(self.hold).await;
        wizard.reset();
        Ok(message)
    }

    /// Submit an admin form and return to the landing page.
    pub async fn register_admin(
        &self,
        wizard: &Wizard<AdminForm>,
        session: &mut Session,
    ) -> Result<&'static str, RegistrationError> {
        let message = self.submit(wizard).await?;
        session.request_navigation(Page::Home);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_core::{Directory, Role};

    fn service() -> LoginService<Directory> {
        LoginService::new(
            Directory::demo().clone(),
            LockoutPolicy::default(),
            Duration::from_millis(1500),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_takes_simulated_delay() {
        let mut svc = service();
        let start = tokio::time::Instant::now();
        let profile = svc.login("CS2021002", "password123").await.unwrap();
        assert_eq!(profile.name, "Drishti Butani");
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_into_session() {
        let mut svc = service();
        let mut session = Session::new();
        session.select_role(Role::Student);
        session.request_navigation(Page::Dashboard);
        assert_eq!(session.current_page(), Page::StudentLogin);

        let welcome = svc
            .login_into(&mut session, "CS2021002", "password123")
            .await
            .unwrap();
        assert_eq!(welcome, "Welcome back, Drishti Butani!");
        assert!(session.is_authenticated());
        assert_eq!(session.current_page(), Page::StudentDashboard);
        assert_eq!(
            session.authenticated_student().unwrap().enrollment_id,
            "CS2021002"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lockout_then_cooldown() {
        let mut svc = service();
        for _ in 0..3 {
            assert!(svc.login("CS2021001", "badpassword").await.is_err());
        }
        let start = tokio::time::Instant::now();
        assert_eq!(
            svc.login("CS2021002", "password123").await,
            Err(LoginError::Locked)
        );
        // Rejected without the round trip.
        assert_eq!(start.elapsed(), Duration::ZERO);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(svc.login("CS2021002", "password123").await.is_ok());
        assert_eq!(svc.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_form_skips_delay() {
        let mut svc = service();
        let start = tokio::time::Instant::now();
        assert_eq!(
            svc.login("CS2021001", "short").await,
            Err(LoginError::PasswordTooShort)
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(svc.attempts(), 0);
    }

    fn complete_admin() -> Wizard<AdminForm> {
        let mut w: Wizard<AdminForm> = Wizard::new();
        let steps: [&[(&str, &str)]; 4] = [
            &[
                ("first-name", "Meera"),
                ("last-name", "Shah"),
                ("email", "meera@example.edu"),
                ("phone", "7777777777"),
            ],
            &[
                ("employee-id", "EMP-042"),
                ("department", "Administration"),
                ("position", "Registrar"),
            ],
            &[
                ("access-level", "Super Admin"),
                ("security-question", "What city were you born in?"),
                ("security-answer", "Rajkot"),
            ],
            &[("emergency-contact", "Raj"), ("emergency-phone", "6666666666")],
        ];
        for (i, step) in steps.iter().enumerate() {
            for (k, v) in step.iter() {
                w.form.set(k, v.to_string()).unwrap();
            }
            if i < 3 {
                w.next().unwrap();
            }
        }
        w
    }

    #[tokio::test(start_paused = true)]
    async fn test_admin_registration_returns_home() {
        let svc = RegistrationService::new(Duration::from_secs(2), Duration::from_secs(3));
        let mut session = Session::new();
        session.select_role(Role::Admin);
        session.request_navigation(Page::Register);
        assert_eq!(session.current_page(), Page::AdminRegister);

        let wizard = complete_admin();
        let msg = svc.register_admin(&wizard, &mut session).await.unwrap();
        assert_eq!(msg, "Admin registration successful!");
        assert_eq!(session.current_page(), Page::Home);
    }

    #[tokio::test(start_paused = true)]
    async fn test_student_registration_resets_after_hold() {
        let svc = RegistrationService::new(Duration::from_secs(2), Duration::from_secs(3));
        let mut w: Wizard<StudentForm> = Wizard::new();
        assert!(svc.register_student(&mut w).await.is_err());

        w.form = StudentForm {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            enrollment_id: "CS2021010".into(),
            email: "asha@example.edu".into(),
            branch: "Civil Engineering".into(),
            year: "1st Year".into(),
            section: "A".into(),
            date_of_birth: "2004-01-01".into(),
            guardian_name: "R. Rao".into(),
            guardian_phone: "9999999999".into(),
            address: "12 Campus Road".into(),
            ..Default::default()
        };
        w.next().unwrap();
        w.next().unwrap();

        let start = tokio::time::Instant::now();
        let msg = svc.register_student(&mut w).await.unwrap();
        assert_eq!(msg, "Student registration successful!");
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(w.step(), 1);
        assert_eq!(w.form, StudentForm::default());
    }
}
