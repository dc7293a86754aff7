use crate::infra::{seed_demo, Platform};
use activity_approvals::config::NotificationConfig;
use activity_approvals::error::AppError;
use activity_approvals::workflows::approvals::{
    ActivityKind, ApproverStatus, Bipra, CreateActivityRequest, FinancialAccountId,
    FinancialDraft, FinancialKind, MatchInput,
};
use activity_approvals::workflows::notifications::{BirthdayReminderJob, Notification};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the demo (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Reject the approval instead of confirming it.
    #[arg(long)]
    pub(crate) reject: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BirthdayArgs {
    /// Day to send reminders for (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) day: Option<NaiveDate>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (platform, worker) = Platform::start(&NotificationConfig::default());
    let parish = seed_demo(&platform.directory, today)?;

    println!("Activity approval demo ({today})");

    let preview = platform.service.match_approvers(&MatchInput {
        organization_id: parish.organization,
        activity_kind: ActivityKind::Service,
        supervisor_membership_id: parish.pastor,
        financial_account_id: Some(FinancialAccountId(5_101)),
        financial_kind: Some(FinancialKind::Expense),
    })?;
    println!(
        "- Matcher: rules {:?} -> approvers {:?}",
        preview
            .matched_rule_ids
            .iter()
            .map(|rule| rule.0)
            .collect::<Vec<_>>(),
        preview
            .membership_ids
            .iter()
            .map(|member| member.0)
            .collect::<Vec<_>>()
    );

    let scheduled = (today + Duration::days(7)).and_hms_opt(9, 0, 0);
    let created = platform.service.create_activity(CreateActivityRequest {
        organization_id: parish.organization,
        supervisor_id: parish.pastor,
        title: "Ibadah Minggu".to_string(),
        kind: ActivityKind::Service,
        bipra: Bipra::Pkb,
        date: scheduled,
        note: Some("Offering for the roof repair fund".to_string()),
        financial: Some(FinancialDraft {
            kind: FinancialKind::Expense,
            account_id: FinancialAccountId(5_101),
            amount: 1_500_000,
        }),
    })?;
    println!(
        "- Created activity {} \"{}\" with {} approver(s)",
        created.activity.id,
        created.activity.title,
        created.approvers.len()
    );

    let decision = if args.reject {
        ApproverStatus::Rejected
    } else {
        ApproverStatus::Approved
    };
    for approver in created
        .approvers
        .iter()
        .filter(|approver| approver.membership_id == parish.treasurer)
    {
        let updated = platform.service.update_approver_status(approver.id, decision)?;
        println!(
            "- Approver {} (membership {}) -> {}",
            updated.id,
            updated.membership_id,
            updated.status.label()
        );
    }

    let birthdays = BirthdayReminderJob::new(platform.directory.as_ref(), platform.dispatcher.as_ref())
        .run(today)
        .await?;
    println!(
        "- Birthday reminders: {} sent, {} already sent",
        birthdays.sent, birthdays.already_sent
    );

    let Platform { notifications, service, .. } = platform;
    drop(service);
    worker.join().await;

    println!("\nNotifications written");
    render_notifications(&notifications.all());
    Ok(())
}

pub(crate) async fn run_birthdays(args: BirthdayArgs) -> Result<(), AppError> {
    let day = args.day.unwrap_or_else(|| Local::now().date_naive());
    let (platform, _worker) = Platform::start(&NotificationConfig::default());
    seed_demo(&platform.directory, day)?;

    let job = BirthdayReminderJob::new(platform.directory.as_ref(), platform.dispatcher.as_ref());
    let first = job.run(day).await?;
    let rerun = job.run(day).await?;

    println!("Birthday reminders for {day}");
    println!(
        "- first run: {} sent, {} failed, {} push failures",
        first.sent, first.failed, first.push_failures
    );
    println!(
        "- rerun: {} sent, {} already sent",
        rerun.sent, rerun.already_sent
    );
    render_notifications(&platform.notifications.all());
    Ok(())
}

fn render_notifications(rows: &[Notification]) {
    if rows.is_empty() {
        println!("  (none)");
        return;
    }
    for row in rows {
        println!(
            "  #{} [{}] -> {}: {} | {}",
            row.id,
            row.kind.code(),
            row.recipient,
            row.title,
            row.body
        );
    }
}
