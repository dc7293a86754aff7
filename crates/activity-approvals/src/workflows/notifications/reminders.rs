use chrono::{Datelike, NaiveDate};
use tracing::info;

use super::dedupe::{BatchReport, DedupeGuard, ScheduledNotification};
use super::dispatcher::NotificationDispatcher;
use super::domain::{NewNotification, NotificationKind};
use super::interest::membership_birthday_interest;
use super::repository::{NotificationRepository, PushTransport};
use crate::workflows::approvals::domain::Membership;
use crate::workflows::approvals::repository::{DirectoryRepository, RepositoryError};

/// Whether `birthday` is celebrated on `day`. 29 February falls back to 28 February in
/// common years.
pub fn birthday_observed_on(birthday: NaiveDate, day: NaiveDate) -> bool {
    if birthday.month() == day.month() && birthday.day() == day.day() {
        return true;
    }

    let leap_day = birthday.month() == 2 && birthday.day() == 29;
    leap_day && day.month() == 2 && day.day() == 28 && !is_leap_year(day.year())
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

pub fn birthday_candidates(memberships: &[Membership], day: NaiveDate) -> Vec<ScheduledNotification> {
    memberships
        .iter()
        .filter(|membership| {
            membership
                .birthday
                .is_some_and(|birthday| birthday_observed_on(birthday, day))
        })
        .map(|membership| ScheduledNotification {
            subject: format!("birthday.{}", membership.id.0),
            notification: NewNotification::new(
                NotificationKind::BirthdayReminder,
                membership_birthday_interest(membership.id),
                format!("Happy birthday, {}!", membership.name),
                "Wishing you joy and blessings on your special day.",
            ),
        })
        .collect()
}

/// Daily job greeting members on their birthday, safe to re-run.
pub struct BirthdayReminderJob<'a, D: ?Sized, N, P> {
    directory: &'a D,
    dispatcher: &'a NotificationDispatcher<N, P>,
}

impl<'a, D, N, P> BirthdayReminderJob<'a, D, N, P>
where
    D: DirectoryRepository + ?Sized,
    N: NotificationRepository + 'static,
    P: PushTransport + 'static,
{
    pub fn new(directory: &'a D, dispatcher: &'a NotificationDispatcher<N, P>) -> Self {
        Self {
            directory,
            dispatcher,
        }
    }

    pub async fn run(&self, day: NaiveDate) -> Result<BatchReport, RepositoryError> {
        let mut memberships = self.directory.birthdays_on(day.month(), day.day())?;
        if day.month() == 2 && day.day() == 28 && !is_leap_year(day.year()) {
            memberships.extend(self.directory.birthdays_on(2, 29)?);
        }

        let candidates = birthday_candidates(&memberships, day);
        let report = DedupeGuard::new(self.dispatcher)
            .run_batch(day, candidates)
            .await;

        info!(
            %day,
            sent = report.sent,
            already_sent = report.already_sent,
            failed = report.failed,
            "birthday reminders processed"
        );
        Ok(report)
    }
}
