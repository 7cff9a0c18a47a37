use log::info;

use crate::agent::UpcomingCheck;
use crate::email::sender::Mailer;
use crate::email::templates::{base_template, contact_box, fmt_amount, info_box};
use crate::email::SendStats;

const COLOR: &str = "#3498db";

/// Remind the tenant and the agent about a payment due soon
pub fn send_upcoming_payment_reminder(mailer: &Mailer, reminder: &UpcomingCheck) -> bool {
	let ch = &reminder.check;
	let subject = format!("Payment Reminder - {}", ch.property_name);

	let tenant_html = base_template("Payment Reminder", &tenant_content(reminder), COLOR);
	let agent_html = base_template("Upcoming Payment Reminder", &agent_content(reminder), COLOR);

	mailer.send_to_tenant_and_agent(
		&ch.tenant_email,
		&ch.agent_email,
		&subject,
		&tenant_html,
		&agent_html,
	)
}

/// Send payment reminders for a batch of checks
pub fn send_batch_upcoming_payment_reminders(mailer: &Mailer, reminders: &[UpcomingCheck]) -> SendStats {
	let mut stats = SendStats {
		total: reminders.len(),
		success: 0,
		failed: 0,
	};

	for reminder in reminders {
		if send_upcoming_payment_reminder(mailer, reminder) {
			stats.success += 1;
		} else {
			stats.failed += 1;
		}
	}

	info!(
		"upcoming payment reminders: {} total, {} success, {} failed",
		stats.total, stats.success, stats.failed
	);
	stats
}

fn tenant_content(reminder: &UpcomingCheck) -> String {
	let ch = &reminder.check;
	format!(
		"<p>Dear {},</p>\n<p>This is a friendly reminder that a payment is due soon.</p>\n{}\n<p>Please ensure payment is made by the due date to avoid late fees.</p>\n{}",
		ch.tenant_name,
		info_box(
			"Payment Details",
			&[
				("Property", ch.property_name.clone()),
				("Location", ch.location.clone()),
				("Check Number", ch.check_no.clone()),
				("Amount Due", fmt_amount(&ch.amount)),
				("Due Date", ch.check_date.to_string()),
				("Days Until Due", format!("{} days", reminder.days_until_due)),
			],
			COLOR,
		),
		contact_box(&ch.agent_name, &ch.agent_email),
	)
}

fn agent_content(reminder: &UpcomingCheck) -> String {
	let ch = &reminder.check;
	format!(
		"<p>Dear {},</p>\n<p>The following payment is due in {} days:</p>\n{}\n<p>Tenant has been notified. Please follow up if needed.</p>",
		ch.agent_name,
		reminder.days_until_due,
		info_box(
			"Payment Details",
			&[
				("Property", ch.property_name.clone()),
				("Location", ch.location.clone()),
				("Tenant", ch.tenant_name.clone()),
				("Tenant Email", ch.tenant_email.clone()),
				("Tenant Phone", ch.tenant_phone.clone()),
				("Check Number", ch.check_no.clone()),
				("Amount", fmt_amount(&ch.amount)),
				("Due Date", ch.check_date.to_string()),
			],
			COLOR,
		),
	)
}
