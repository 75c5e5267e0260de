/// Available commands and autocomplete logic

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home", "careers"],
    description: "Profile and career matches",
  },
  Command {
    name: "analysis",
    aliases: &["a", "profile", "quiz"],
    description: "Redo the career analysis",
  },
  Command {
    name: "internships",
    aliases: &["i", "jobs", "intern"],
    description: "Search internships",
  },
  Command {
    name: "books",
    aliases: &["b", "book", "reading"],
    description: "Featured books and book search",
  },
  Command {
    name: "dsa",
    aliases: &["p", "practice", "problems"],
    description: "DSA practice problems",
  },
  Command {
    name: "optimize",
    aliases: &["o", "resume", "linkedin"],
    description: "Resume and LinkedIn optimizer",
  },
  Command {
    name: "bookmarks",
    aliases: &["bm", "saved"],
    description: "Saved items",
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "Forget the session",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit careerdash",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let rank = |cmd: &Command| -> Option<u32> {
    let input = input_lower.as_str();
    if cmd.name == input {
      Some(0)
    } else if cmd.aliases.contains(&input) {
      Some(1)
    } else if cmd.name.starts_with(input) {
      Some(2)
    } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
      Some(3)
    } else if cmd.name.contains(input) {
      Some(4)
    } else if cmd.aliases.iter().any(|a| a.contains(input)) {
      Some(5)
    } else {
      None
    }
  };

  let mut matches: Vec<(&'static Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd).map(|r| (cmd, r)))
    .collect();

  // Stable, so equal ranks keep table order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("books");
    assert_eq!(suggestions[0].name, "books");
  }

  #[test]
  fn test_alias_beats_prefix() {
    // "b" is an alias of books and a prefix of bookmarks
    let suggestions = get_suggestions("b");
    assert_eq!(suggestions[0].name, "books");
    assert!(suggestions.iter().any(|c| c.name == "bookmarks"));
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("int");
    assert_eq!(suggestions[0].name, "internships");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("mark");
    assert_eq!(suggestions[0].name, "bookmarks");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("xyz").is_empty());
  }
}
