use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{error, info};

use crate::config::SmtpConfig;

/// SMTP client for outbound notification mail
///
/// Construction is cheap; no connection is opened until the first send.
#[derive(Clone)]
pub struct Mailer {
	transport: SmtpTransport,
	from: Mailbox,
}

impl Mailer {
	pub fn new(config: &SmtpConfig) -> Result<Mailer, String> {
		let from = format!("EstateLink <{}>", config.from_email)
			.parse::<Mailbox>()
			.map_err(|e| format!("invalid sender address {}: {}", config.from_email, e))?;

		let transport = SmtpTransport::starttls_relay(&config.server)
			.map_err(|e| format!("smtp relay {}: {}", config.server, e))?
			.port(config.port)
			.credentials(Credentials::new(
				config.username.clone(),
				config.password.clone(),
			))
			.build();

		Ok(Mailer { transport, from })
	}

	/// Send one HTML message
	///
	/// Delivery failure is logged and reported as `false`, never raised:
	/// one recipient failing must not block the other recipient's attempt.
	pub fn send(&self, to: &str, subject: &str, html: &str) -> bool {
		let mailbox = match to.parse::<Mailbox>() {
			Ok(v) => v,
			Err(e) => {
				error!("invalid recipient address {}: {}", to, e);
				return false;
			}
		};

		let message = match Message::builder()
			.from(self.from.clone())
			.to(mailbox)
			.subject(subject)
			.header(ContentType::TEXT_HTML)
			.body(html.to_string())
		{
			Ok(m) => m,
			Err(e) => {
				error!("building email to {}: {}", to, e);
				return false;
			}
		};

		match self.transport.send(&message) {
			Ok(_) => {
				info!("email sent to {}", to);
				true
			}
			Err(e) => {
				error!("failed to send email to {}: {}", to, e);
				false
			}
		}
	}

	/// Dispatch one alert to both parties; true when at least one went out
	pub fn send_to_tenant_and_agent(
		&self,
		tenant_email: &str,
		agent_email: &str,
		subject: &str,
		tenant_html: &str,
		agent_html: &str,
	) -> bool {
		let tenant_sent = self.send(tenant_email, subject, tenant_html);
		let agent_sent = self.send(agent_email, subject, agent_html);

		tenant_sent || agent_sent
	}
}
