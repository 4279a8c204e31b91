//! Invitation email content.

use famlist_storage::Role;

/// Rendered subject, plain-text, and HTML bodies for an invitation email.
pub struct InvitationEmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl InvitationEmailContent {
    pub fn new(family_name: &str, inviter_email: &str, role: Role) -> Self {
        let subject = format!("You've been invited to join {}", family_name);

        let text = format!(
            "Hi,\n\n\
             {inviter} invited you to join the family group \"{family}\" as {role}.\n\n\
             Open the app and check your pending invitations to accept or decline.\n\
             The invitation expires in 7 days.\n",
            inviter = inviter_email,
            family = family_name,
            role = role.as_str(),
        );

        let html = format!(
            r#"<html>
<body style="font-family: sans-serif; color: #333;">
  <h2>Family group invitation</h2>
  <p><strong>{inviter}</strong> invited you to join <strong>{family}</strong> as <em>{role}</em>.</p>
  <p>Open the app and check your pending invitations to accept or decline.</p>
  <p style="color: #777; font-size: 12px;">The invitation expires in 7 days.</p>
</body>
</html>"#,
            inviter = inviter_email,
            family = family_name,
            role = role.as_str(),
        );

        Self {
            subject,
            text,
            html,
        }
    }
}
