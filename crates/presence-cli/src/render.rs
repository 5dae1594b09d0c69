//! Plain-text renderings of each screen.

use presence_core::dashboard::{
    self, StudentFilter, StudentSummary, ADMIN_WEEKLY_TREND, ANOMALIES, BRANCH_SHARE, DAILY,
    HEADLINE, HISTORY, MONTHLY, STUDENT_WEEKLY, SUBJECTS,
};
use presence_core::registration::WizardForm;
use presence_core::{
    AttendanceRecord, DetectionState, Directory, Page, Role, Roster, Session, StudentProfile,
};
use presence_live::{PipelineEvent, Snapshot};

pub fn page(session: &Session) {
    let role = session
        .user_role()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".into());
    println!();
    println!("== {} == (role: {role})", title(session.current_page()));
    match session.current_page() {
        Page::UserSelect => println!("Choose a role: `role admin` or `role student`."),
        Page::Home => home(session.user_role()),
        Page::StudentLogin => {
            println!("`login <enrollment-id> <password>`, `forgot`, `biometric`.")
        }
        Page::Attendance => println!("`camera` to start or stop the feed, `status` for the log."),
        Page::Dashboard => println!("`filter [search=..] [branch=..] [status=..]`, `export`."),
        Page::Register | Page::StudentRegister | Page::AdminRegister => {
            println!("`set <field> <value>`, `next`, `back`, `submit`.")
        }
        Page::StudentDashboard => {}
    }
}

fn title(page: Page) -> &'static str {
    match page {
        Page::UserSelect => "Select User Type",
        Page::Home => "AI Attendance",
        Page::Register | Page::StudentRegister => "Student Registration",
        Page::AdminRegister => "Admin Registration",
        Page::StudentLogin => "Student Login",
        Page::Attendance => "Live Attendance",
        Page::Dashboard => "Admin Dashboard",
        Page::StudentDashboard => "Student Dashboard",
    }
}

fn home(role: Option<Role>) {
    match role {
        Some(Role::Admin) => {
            println!("Manage students, monitor live attendance and review analytics.");
            println!("`go register`, `go attendance`, `go dashboard`");
        }
        Some(Role::Student) => {
            println!("Mark your attendance and track your personal record.");
            println!("`go attendance`, `go dashboard`");
        }
        None => println!("`go register`, `go attendance`"),
    }
}

pub fn wizard_step<F: WizardForm>(step: u8, fields: &[(&str, &str)]) {
    println!("Step {step} of {}", F::TOTAL_STEPS);
    for (name, value) in fields {
        let shown = if value.is_empty() { "<empty>" } else { value };
        println!("  {name:<18} {shown}");
        if let Some((_, options)) = F::options(name) {
            println!("  {:<18} one of: {}", "", options.join(" | "));
        }
    }
}

pub fn roster(dir: &Directory) {
    for s in dir.students() {
        println!(
            "{:<10} {:<18} {:<42} {}",
            s.enrollment_id, s.name, s.branch, s.year
        );
    }
}

pub fn admin_dashboard(filter: &StudentFilter) {
    let h = &HEADLINE;
    println!(
        "Total students {} (+{} this week) | Today {:.1}% ({}/{}) | Week avg {:.1}% ({:+.1}%) | Alerts {}",
        h.total_students,
        h.new_this_week,
        h.today_rate,
        h.today_present,
        h.total_students,
        h.weekly_average,
        h.weekly_delta,
        h.security_alerts,
    );
    println!();
    println!("Daily attendance:");
    for d in DAILY {
        println!("  {:<4} present {:>3}  absent {:>3}", d.day, d.present, d.absent);
    }
    let shares: Vec<String> = BRANCH_SHARE
        .iter()
        .map(|(b, v)| format!("{b} {v}%"))
        .collect();
    println!("Branches: {}", shares.join(", "));
    let trend: Vec<String> = ADMIN_WEEKLY_TREND
        .iter()
        .map(|(w, v)| format!("{w} {v}%"))
        .collect();
    println!("Weekly trend: {}", trend.join(", "));
    println!();
    println!(
        "{:<10} {:<18} {:<6} {:<6} {:<20} {}",
        "ID", "Name", "Branch", "Att.", "Last seen", "Status"
    );
    for r in dashboard::filter_students(filter) {
        println!(
            "{:<10} {:<18} {:<6} {:<6} {:<20} {:?}",
            r.enrollment_id, r.name, r.branch, r.attendance, r.last_seen, r.status
        );
    }
    println!();
    println!("Anomalies:");
    for a in ANOMALIES {
        println!("  [{}] {} {}: {}", a.severity, a.timestamp, a.kind, a.description);
    }
}

pub fn student_dashboard(student: Option<&StudentProfile>, fallback: &StudentProfile) {
    let summary = StudentSummary::for_student(student, fallback);
    let s = &summary.student;
    println!("{} ({})", s.name, s.enrollment_id);
    println!("{} | {} | {}", s.branch, s.year, s.department);
    println!(
        "Attendance {}% ({}/{} classes) | {:?}",
        summary.percentage, summary.attended_classes, summary.total_classes, summary.standing
    );
    println!();
    println!("Recent:");
    for h in HISTORY {
        let mark = if h.present { "Present" } else { "Absent" };
        println!("  {:<7} {:<8} {}", h.date, mark, h.time);
    }
    let weekly: Vec<String> = STUDENT_WEEKLY
        .iter()
        .map(|(w, v)| format!("{w} {v}%"))
        .collect();
    println!("Weekly: {}", weekly.join(", "));
    let subjects: Vec<String> = SUBJECTS.iter().map(|(n, v)| format!("{n} {v}%")).collect();
    println!("Subjects: {}", subjects.join(", "));
    let monthly: Vec<String> = MONTHLY
        .iter()
        .map(|(m, p, a)| format!("{m} {p}/{}", p + a))
        .collect();
    println!("Monthly: {}", monthly.join(", "));
}

pub fn event(ev: &PipelineEvent) {
    match ev {
        PipelineEvent::Camera { on } => {
            println!("camera {}", if *on { "on" } else { "off" })
        }
        PipelineEvent::Detection { state } => println!("detection: {}", detection(state)),
        PipelineEvent::Liveness { state } => println!("liveness: {state}"),
        PipelineEvent::Recorded { record: r } => record(r),
    }
}

pub fn detection(state: &DetectionState) -> String {
    match state {
        DetectionState::Detected {
            student,
            confidence,
        } => format!(
            "detected {} ({}) {confidence}%",
            student.name, student.enrollment_id
        ),
        other => other.label().to_string(),
    }
}

pub fn record(r: &AttendanceRecord) {
    println!(
        "{:<11} {:<16} {:<10} {:<8} {}",
        r.timestamp, r.name, r.enrollment_id, r.status, r.id
    );
}

pub fn snapshot(snap: &Snapshot) {
    println!(
        "camera {} | {} | liveness {} | {} present, {} unknown, {} spoof attempts",
        if snap.camera_on { "on" } else { "off" },
        detection(&snap.detection),
        snap.liveness,
        snap.counts.present,
        snap.counts.unknown,
        snap.counts.spoof,
    );
}
