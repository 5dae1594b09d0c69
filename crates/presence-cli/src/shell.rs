//! Interactive session: one [`Session`] driven by typed commands.
//!
//! The live pipeline exists only while the session is on the attendance
//! page. Leaving the page drops the pipeline and its log with it.

use crate::{build_filter, default_student, make_draw, render};
use anyhow::{bail, Context, Result};
use presence_core::dashboard::{StudentFilter, EXPORT_ACK};
use presence_core::registration::{AdminForm, StudentForm, Wizard, WizardForm};
use presence_core::{Directory, Page, Role, Session, StudentProfile};
use presence_live::{spawn_pipeline, Config, LoginService, PipelineHandle, RegistrationService};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

const HELP: &str = "\
role <admin|student>        choose a role and go home
go <page>                   home, register, attendance, dashboard, user-select
login <enrollment-id> <pw>  on the login page
forgot | biometric          login page extras
camera                      toggle the camera on the attendance page
status                      live counts and the attendance log
set <field> <value>         fill a registration field
next | back | submit        move through the registration wizard
filter [key=value ...]      search=, branch=, status= on the admin dashboard
export                      export the admin table
signout                     forget the role and login
help | quit";

enum Flow {
    Continue,
    Quit,
}

/// A running pipeline and the task echoing its events.
struct LiveView {
    handle: PipelineHandle,
    printer: JoinHandle<()>,
}

impl Drop for LiveView {
    fn drop(&mut self) {
        self.printer.abort();
    }
}

pub struct Shell {
    config: Config,
    directory: Directory,
    fallback: StudentProfile,
    session: Session,
    login: LoginService<Directory>,
    registration: RegistrationService,
    student_form: Wizard<StudentForm>,
    admin_form: Wizard<AdminForm>,
    filter: StudentFilter,
    live: Option<LiveView>,
    seed: Option<u64>,
}

impl Shell {
    pub fn new(config: Config, seed: Option<u64>) -> Result<Self> {
        let directory = config.directory()?;
        let fallback = default_student(&directory)?;
        let login = LoginService::new(directory.clone(), config.lockout(), config.login_delay());
        let registration =
            RegistrationService::new(config.registration_delay(), config.registration_hold());
        Ok(Self {
            config,
            directory,
            fallback,
            session: Session::new(),
            login,
            registration,
            student_form: Wizard::new(),
            admin_form: Wizard::new(),
            filter: StudentFilter::default(),
            live: None,
            seed,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        self.show_page();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            let before = self.session.current_page();
            match self.dispatch(line.trim()).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => println!("{e}"),
            }
            self.sync_live();
            if self.session.current_page() != before {
                self.show_page();
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, line: &str) -> Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = words.collect();

        match command {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => println!("{HELP}"),
            "role" => {
                let role: Role = args
                    .first()
                    .context("usage: role <admin|student>")?
                    .parse()?;
                self.session.select_role(role);
            }
            "go" => {
                let page: Page = args.first().context("usage: go <page>")?.parse()?;
                if self.session.resolve(page).is_none() {
                    println!("Choose a role first.");
                }
                self.session.request_navigation(page);
            }
            "login" => {
                self.expect_page(&[Page::StudentLogin])?;
                let id = args.first().copied().unwrap_or_default();
                let password = args.get(1).copied().unwrap_or_default();
                let welcome = self
                    .login
                    .login_into(&mut self.session, id, password)
                    .await?;
                println!("{welcome}");
            }
            "forgot" => {
                self.expect_page(&[Page::StudentLogin])?;
                println!("Password reset link would be sent to your registered email.");
            }
            "biometric" => {
                self.expect_page(&[Page::StudentLogin])?;
                println!("Biometric authentication would be initiated here.");
            }
            "camera" => {
                self.live_handle()?.toggle_camera().await?;
            }
            "status" => {
                let handle = self.live_handle()?;
                let snapshot = handle.snapshot().await?;
                let records = handle.records().await?;
                render::snapshot(&snapshot);
                if records.is_empty() {
                    println!("No attendance records yet.");
                }
                for record in &records {
                    render::record(record);
                }
            }
            "set" => {
                let field = args.first().context("usage: set <field> <value>")?;
                let value = args[1..].join(" ");
                match self.session.current_page() {
                    Page::StudentRegister => self.student_form.form.set(field, value)?,
                    Page::AdminRegister => self.admin_form.form.set(field, value)?,
                    _ => bail!("No registration form is open."),
                }
                self.show_wizard();
            }
            "next" | "back" => {
                let forward = command == "next";
                match self.session.current_page() {
                    Page::StudentRegister => move_wizard(&mut self.student_form, forward)?,
                    Page::AdminRegister => move_wizard(&mut self.admin_form, forward)?,
                    _ => bail!("No registration form is open."),
                }
                self.show_wizard();
            }
            "submit" => self.submit().await?,
            "filter" => {
                self.expect_page(&[Page::Dashboard])?;
                let (mut search, mut branch, mut status) = (None, None, None);
                for arg in &args {
                    let (key, value) = arg
                        .split_once('=')
                        .with_context(|| format!("expected key=value, got {arg}"))?;
                    let slot = match key {
                        "search" => &mut search,
                        "branch" => &mut branch,
                        "status" => &mut status,
                        other => bail!("unknown filter: {other}"),
                    };
                    *slot = Some(value.to_string());
                }
                self.filter = build_filter(search, branch, status)?;
                render::admin_dashboard(&self.filter);
            }
            "export" => {
                self.expect_page(&[Page::Dashboard])?;
                println!("{EXPORT_ACK}");
            }
            "signout" => self.session.sign_out(),
            other => bail!("unknown command: {other} (try `help`)"),
        }
        Ok(Flow::Continue)
    }

    async fn submit(&mut self) -> Result<()> {
        match self.session.current_page() {
            Page::StudentRegister => {
                if !self.student_form.is_last_step() {
                    bail!("Finish every step before submitting.");
                }
                println!("Submitting...");
                let message = self
                    .registration
                    .register_student(&mut self.student_form)
                    .await?;
                println!("{message}");
                self.show_wizard();
            }
            Page::AdminRegister => {
                if !self.admin_form.is_last_step() {
                    bail!("Finish every step before submitting.");
                }
                println!("Submitting...");
                let message = self
                    .registration
                    .register_admin(&self.admin_form, &mut self.session)
                    .await?;
                println!("{message}");
                self.admin_form.reset();
            }
            _ => bail!("No registration form is open."),
        }
        Ok(())
    }

    fn expect_page(&self, pages: &[Page]) -> Result<()> {
        if pages.contains(&self.session.current_page()) {
            Ok(())
        } else {
            bail!("Not available on this page.")
        }
    }

    fn live_handle(&self) -> Result<&PipelineHandle> {
        self.live
            .as_ref()
            .map(|live| &live.handle)
            .context("Open the attendance page first: `go attendance`.")
    }

    /// Start the pipeline on entering the attendance page, drop it on leaving.
    fn sync_live(&mut self) {
        let on_attendance = self.session.current_page() == Page::Attendance;
        if on_attendance && self.live.is_none() {
            let handle = spawn_pipeline(
                self.config.pipeline(),
                self.directory.clone(),
                make_draw(self.seed),
            );
            let mut events = handle.subscribe();
            let printer = tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => render::event(&event),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event feed lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            self.live = Some(LiveView { handle, printer });
        } else if !on_attendance && self.live.take().is_some() {
            tracing::debug!("left attendance page, live log discarded");
        }
    }

    fn show_page(&self) {
        render::page(&self.session);
        match self.session.current_page() {
            Page::Dashboard => render::admin_dashboard(&self.filter),
            Page::StudentDashboard => {
                render::student_dashboard(self.session.authenticated_student(), &self.fallback)
            }
            Page::StudentRegister | Page::AdminRegister => self.show_wizard(),
            _ => {}
        }
    }

    fn show_wizard(&self) {
        match self.session.current_page() {
            Page::StudentRegister => wizard_step(&self.student_form),
            Page::AdminRegister => wizard_step(&self.admin_form),
            _ => {}
        }
    }
}

fn move_wizard<F: WizardForm>(wizard: &mut Wizard<F>, forward: bool) -> Result<()> {
    if forward {
        wizard.next()?;
    } else {
        wizard.previous();
    }
    Ok(())
}

fn wizard_step<F: WizardForm>(wizard: &Wizard<F>) {
    let step = wizard.step();
    render::wizard_step::<F>(step, &wizard.form.step_fields(step));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn shell() -> Shell {
        Shell::new(Config::default(), Some(7)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_attendance_discards_log() {
        let mut shell = shell();
        shell.dispatch("role admin").await.unwrap();
        shell.dispatch("go attendance").await.unwrap();
        shell.sync_live();
        shell.dispatch("camera").await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let records = shell.live_handle().unwrap().records().await.unwrap();
        assert!(!records.is_empty());

        shell.dispatch("go home").await.unwrap();
        shell.sync_live();
        assert!(shell.live.is_none());
        assert!(shell.dispatch("status").await.is_err());

        shell.dispatch("go attendance").await.unwrap();
        shell.sync_live();
        let handle = shell.live_handle().unwrap();
        assert!(handle.records().await.unwrap().is_empty());
        assert!(!handle.snapshot().await.unwrap().camera_on);
    }

    #[tokio::test]
    async fn test_wizard_rejects_free_text_for_select_fields() {
        let mut shell = shell();
        shell.dispatch("role student").await.unwrap();
        shell.dispatch("go register").await.unwrap();
        assert_eq!(shell.session.current_page(), Page::StudentRegister);

        assert!(shell.dispatch("set branch Astrology").await.is_err());
        shell
            .dispatch("set branch information technology")
            .await
            .unwrap();
        assert_eq!(shell.student_form.form.branch, "Information Technology");
    }
}
