use log::info;

use crate::agent::OverdueCheck;
use crate::email::sender::Mailer;
use crate::email::templates::{alert_banner, base_template, contact_box, fmt_amount, info_box, Alert};
use crate::email::SendStats;

const COLOR: &str = "#c0392b";

/// Notify the tenant and the agent about a payment past its due date
pub fn send_overdue_payment_alert(mailer: &Mailer, alert: &OverdueCheck) -> bool {
	let ch = &alert.check;
	let subject = format!("URGENT: Overdue Payment - {}", ch.property_name);

	let tenant_html = base_template("OVERDUE PAYMENT NOTICE", &tenant_content(alert), COLOR);
	let agent_html = base_template("Overdue Payment Alert", &agent_content(alert), COLOR);

	mailer.send_to_tenant_and_agent(
		&ch.tenant_email,
		&ch.agent_email,
		&subject,
		&tenant_html,
		&agent_html,
	)
}

/// Send overdue alerts for a batch of checks
pub fn send_batch_overdue_payment_alerts(mailer: &Mailer, alerts: &[OverdueCheck]) -> SendStats {
	let mut stats = SendStats {
		total: alerts.len(),
		success: 0,
		failed: 0,
	};

	for alert in alerts {
		if send_overdue_payment_alert(mailer, alert) {
			stats.success += 1;
		} else {
			stats.failed += 1;
		}
	}

	info!(
		"overdue payment alerts: {} total, {} success, {} failed",
		stats.total, stats.success, stats.failed
	);
	stats
}

fn tenant_content(alert: &OverdueCheck) -> String {
	let ch = &alert.check;
	format!(
		"<p>Dear {},</p>\n{}\n{}\n<p>Please arrange payment immediately to avoid late fees and legal action.</p>\n{}",
		ch.tenant_name,
		alert_banner(
			"This is an urgent notice regarding an overdue payment.",
			Alert::Danger,
		),
		info_box(
			"Payment Details",
			&[
				("Property", ch.property_name.clone()),
				("Location", ch.location.clone()),
				("Check Number", ch.check_no.clone()),
				("Amount Due", fmt_amount(&ch.amount)),
				("Due Date", ch.check_date.to_string()),
				("Days Overdue", format!("{} days", alert.days_overdue)),
			],
			COLOR,
		),
		contact_box(&ch.agent_name, &ch.agent_email),
	)
}

fn agent_content(alert: &OverdueCheck) -> String {
	let ch = &alert.check;
	format!(
		"<p>Dear {},</p>\n{}\n{}\n<p>Please follow up with the tenant immediately.</p>",
		ch.agent_name,
		alert_banner(
			&format!("The following payment is {} days overdue.", alert.days_overdue),
			Alert::Danger,
		),
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
				("Days Overdue", format!("{} days", alert.days_overdue)),
			],
			COLOR,
		),
	)
}

#[cfg(test)]
mod tests {
	use std::str::FromStr;

	use bigdecimal::BigDecimal;
	use chrono::NaiveDate;

	use crate::check::CheckDetail;

	use super::*;

	fn alert() -> OverdueCheck {
		OverdueCheck {
			check: CheckDetail {
				check_id: 11,
				check_no: "CHK00302".to_string(),
				check_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
				amount: BigDecimal::from_str("24000").unwrap(),
				contract_id: 3,
				property_name: "Palm Vista 07".to_string(),
				location: "Palm Jumeirah".to_string(),
				tenant_name: "Lina Farouk".to_string(),
				tenant_email: "lina@example.com".to_string(),
				tenant_phone: "+971501234567".to_string(),
				agent_name: "Omar Khalil".to_string(),
				agent_email: "omar@estatelink.example".to_string(),
			},
			days_overdue: 12,
		}
	}

	#[test]
	fn tenant_body_flags_the_urgency() {
		let body = tenant_content(&alert());
		assert!(body.contains("Dear Lina Farouk,"));
		assert!(body.contains("urgent notice"));
		assert!(body.contains("CHK00302"));
		assert!(body.contains("AED 24,000.00"));
		assert!(body.contains("12 days"));
	}

	#[test]
	fn agent_body_carries_tenant_contact_details() {
		let body = agent_content(&alert());
		assert!(body.contains("Dear Omar Khalil,"));
		assert!(body.contains("12 days overdue"));
		assert!(body.contains("lina@example.com"));
		assert!(body.contains("+971501234567"));
	}
}
