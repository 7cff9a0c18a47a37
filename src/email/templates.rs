use bigdecimal::BigDecimal;

/// Wrap body content in the shared EstateLink layout
pub fn base_template(title: &str, content: &str, color: &str) -> String {
	format!(
		r#"<html>
	<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
		<div style="max-width: 600px; margin: 0 auto; padding: 20px;">
			<h2 style="color: {color};">{title}</h2>
			{content}
			<p style="margin-top: 30px; font-size: 0.9em; color: #666;">
				This is an automated notification from EstateLink Property Management System.
			</p>
		</div>
	</body>
</html>"#
	)
}

/// Bordered box of label/value pairs
pub fn info_box(title: &str, items: &[(&str, String)], color: &str) -> String {
	let items_html: String = items
		.iter()
		.map(|(label, value)| format!("<p><strong>{}:</strong> {}</p>", label, value))
		.collect();

	format!(
		r#"<div style="background-color: #f8f9fa; padding: 15px; border-left: 4px solid {color}; margin: 20px 0;">
	<h3 style="margin-top: 0;">{title}</h3>
	{items_html}
</div>"#
	)
}

/// Agent contact details footer
pub fn contact_box(name: &str, email: &str) -> String {
	format!(
		r#"<div style="margin-top: 20px; padding: 15px; background-color: #e8f4f8; border-radius: 5px;">
	<h4 style="margin-top: 0;">Agent Contact:</h4>
	<p><strong>Name:</strong> {name}</p>
	<p><strong>Email:</strong> {email}</p>
</div>"#
	)
}

#[derive(Clone, Copy, Debug)]
pub enum Alert {
	Info,
	Warning,
	Danger,
	Success,
}

impl Alert {
	fn border_color(self) -> &'static str {
		match self {
			Alert::Info => "#3498db",
			Alert::Warning => "#f59e0b",
			Alert::Danger => "#c0392b",
			Alert::Success => "#10b981",
		}
	}

	fn background_color(self) -> &'static str {
		match self {
			Alert::Info => "#dbeafe",
			Alert::Warning => "#fff3cd",
			Alert::Danger => "#fee",
			Alert::Success => "#d1fae5",
		}
	}
}

/// Highlighted one-line banner
pub fn alert_banner(message: &str, level: Alert) -> String {
	format!(
		r#"<div style="background-color: {bg}; border-left: 4px solid {border}; padding: 12px; margin: 15px 0;">
	<p style="margin: 0;"><strong>{message}</strong></p>
</div>"#,
		bg = level.background_color(),
		border = level.border_color(),
	)
}

/// Currency rendering for email bodies: "AED 12,000.00"
pub fn fmt_amount(amount: &BigDecimal) -> String {
	let fixed = amount.round(2).with_scale(2).to_string();
	let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

	let negative = whole.starts_with('-');
	let digits = whole.trim_start_matches('-');

	let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, ch) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			grouped.push(',');
		}
		grouped.push(ch);
	}

	format!("AED {}{}.{}", if negative { "-" } else { "" }, grouped, frac)
}

#[cfg(test)]
mod tests {
	use std::str::FromStr;

	use super::*;

	#[test]
	fn amounts_are_grouped_by_thousands() {
		let cases = vec![
			("0", "AED 0.00"),
			("950", "AED 950.00"),
			("3000", "AED 3,000.00"),
			("3333.33", "AED 3,333.33"),
			("1250000.5", "AED 1,250,000.50"),
			("-45000", "AED -45,000.00"),
		];

		for (input, want) in cases {
			let amount = BigDecimal::from_str(input).unwrap();
			assert_eq!(fmt_amount(&amount), want, "formatting {}", input);
		}
	}

	#[test]
	fn info_box_renders_every_item() {
		let html = info_box(
			"Payment Details",
			&[
				("Property", "Marina Heights 1204".to_string()),
				("Amount Due", "AED 3,000.00".to_string()),
			],
			"#c0392b",
		);

		assert!(html.contains("Payment Details"));
		assert!(html.contains("<strong>Property:</strong> Marina Heights 1204"));
		assert!(html.contains("<strong>Amount Due:</strong> AED 3,000.00"));
		assert!(html.contains("#c0392b"));
	}

	#[test]
	fn base_template_wraps_the_content() {
		let html = base_template("Payment Reminder", "<p>hello</p>", "#3498db");
		assert!(html.starts_with("<html>"));
		assert!(html.contains("Payment Reminder"));
		assert!(html.contains("<p>hello</p>"));
		assert!(html.contains("automated notification from EstateLink"));
	}
}
