use log::info;

use crate::agent::ExpiringContract;
use crate::email::sender::Mailer;
use crate::email::templates::{base_template, contact_box, fmt_amount, info_box};
use crate::email::SendStats;

const COLOR: &str = "#e74c3c";

/// Notify the tenant and the agent that a contract is nearing expiry
pub fn send_contract_expiry_alert(mailer: &Mailer, alert: &ExpiringContract) -> bool {
	let c = &alert.contract;
	let subject = format!("Contract Expiry Alert - {}", c.property_name);

	let tenant_html = base_template("Contract Expiry Notice", &tenant_content(alert), COLOR);
	let agent_html = base_template("Contract Expiry Alert", &agent_content(alert), COLOR);

	mailer.send_to_tenant_and_agent(
		&c.tenant_email,
		&c.agent_email,
		&subject,
		&tenant_html,
		&agent_html,
	)
}

/// Send expiry alerts for a batch of contracts
pub fn send_batch_contract_expiry_alerts(mailer: &Mailer, alerts: &[ExpiringContract]) -> SendStats {
	let mut stats = SendStats {
		total: alerts.len(),
		success: 0,
		failed: 0,
	};

	for alert in alerts {
		if send_contract_expiry_alert(mailer, alert) {
			stats.success += 1;
		} else {
			stats.failed += 1;
		}
	}

	info!(
		"contract expiry alerts: {} total, {} success, {} failed",
		stats.total, stats.success, stats.failed
	);
	stats
}

fn tenant_content(alert: &ExpiringContract) -> String {
	let c = &alert.contract;
	format!(
		"<p>Dear {},</p>\n<p>This is to inform you that your tenancy contract is expiring soon.</p>\n{}\n<p>Please contact your agent to discuss renewal or move-out arrangements.</p>\n{}",
		c.tenant_name,
		info_box(
			"Contract Details",
			&[
				("Property", c.property_name.clone()),
				("Location", c.location.clone()),
				("Expiry Date", c.expiry_date.to_string()),
				("Days Until Expiry", format!("{} days", alert.days_until_expiry)),
				("Annual Rent", fmt_amount(&c.annual_rent)),
			],
			COLOR,
		),
		contact_box(&c.agent_name, &c.agent_email),
	)
}

fn agent_content(alert: &ExpiringContract) -> String {
	let c = &alert.contract;
	format!(
		"<p>Dear {},</p>\n<p>The following contract is expiring in {} days:</p>\n{}\n<p>Please follow up with the tenant regarding renewal or move-out.</p>",
		c.agent_name,
		alert.days_until_expiry,
		info_box(
			"Contract Details",
			&[
				("Property", c.property_name.clone()),
				("Location", c.location.clone()),
				("Tenant", c.tenant_name.clone()),
				("Tenant Email", c.tenant_email.clone()),
				("Tenant Phone", c.tenant_phone.clone()),
				("Expiry Date", c.expiry_date.to_string()),
				("Annual Rent", fmt_amount(&c.annual_rent)),
			],
			COLOR,
		),
	)
}
