//! Local validation of user input. An invalid form never reaches the network.

use crate::api::types::{OptimizeKind, OptimizeRequest, Profile};
use crate::catalog::EDUCATION_OPTIONS;
use crate::error::ValidationError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MIN: usize = 6;
pub const OPTIMIZE_TEXT_MAX: usize = 8000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
}

impl LoginForm {
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: password.into(),
    }
  }

  /// Returns the trimmed username on success.
  pub fn validate(&self) -> Result<String, ValidationError> {
    let username = self.username.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
      return Err(ValidationError::new(
        "username",
        format!("must be {}-{} characters", USERNAME_MIN, USERNAME_MAX),
      ));
    }
    if !username
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
      return Err(ValidationError::new(
        "username",
        "may only contain letters, digits, '_', '.' and '-'",
      ));
    }
    if self.password.chars().count() < PASSWORD_MIN {
      return Err(ValidationError::new(
        "password",
        format!("must be at least {} characters", PASSWORD_MIN),
      ));
    }
    Ok(username.to_string())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeForm {
  pub kind: OptimizeKind,
  pub text: String,
}

impl OptimizeForm {
  pub fn validate(&self) -> Result<OptimizeRequest, ValidationError> {
    let text = self.text.trim();
    if text.is_empty() {
      return Err(ValidationError::new("text", "paste your text first"));
    }
    let len = text.chars().count();
    if len > OPTIMIZE_TEXT_MAX {
      return Err(ValidationError::new(
        "text",
        format!("{} characters, the limit is {}", len, OPTIMIZE_TEXT_MAX),
      ));
    }
    Ok(OptimizeRequest {
      kind: self.kind,
      text: text.to_string(),
    })
  }
}

/// The career analysis questionnaire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
  pub interests: Vec<String>,
  /// Comma separated
  pub skills: String,
  pub education: String,
  pub target_role: String,
}

impl ProfileForm {
  pub fn from_profile(profile: &Profile) -> Self {
    Self {
      interests: profile.interests.clone(),
      skills: profile.skills.join(", "),
      education: profile.education.clone(),
      target_role: profile.target_role.clone().unwrap_or_default(),
    }
  }

  pub fn toggle_interest(&mut self, interest: &str) {
    if let Some(pos) = self.interests.iter().position(|i| i == interest) {
      self.interests.remove(pos);
    } else {
      self.interests.push(interest.to_string());
    }
  }

  pub fn skills(&self) -> Vec<String> {
    self
      .skills
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .collect()
  }

  /// Build the profile to send, keeping the username from `base`.
  pub fn validate(&self, base: &Profile) -> Result<Profile, ValidationError> {
    if self.interests.is_empty() {
      return Err(ValidationError::new("interests", "pick at least one interest"));
    }
    if !EDUCATION_OPTIONS.contains(&self.education.as_str()) {
      return Err(ValidationError::new("education", "choose one of the listed options"));
    }
    let target_role = self.target_role.trim();
    Ok(Profile {
      username: base.username.clone(),
      interests: self.interests.clone(),
      skills: self.skills(),
      education: self.education.clone(),
      target_role: (!target_role.is_empty()).then(|| target_role.to_string()),
    })
  }
}
