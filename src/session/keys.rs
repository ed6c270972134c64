use super::Action;

/// Single-key shortcuts for mode selection. Modifier combinations
/// (undo/redo) are handled outside this table.
pub fn key_to_action(key: &str) -> Option<Action> {
    match key {
        "1" | "0" => Some(Action::Select),
        "2" | "s" => Some(Action::Snapshot),
        "3" | "x" => Some(Action::Execute),
        "4" | "p" => Some(Action::Place),
        "5" | "t" => Some(Action::Transition),
        "6" | "a" => Some(Action::Arc),
        "7" | "k" => Some(Action::Token),
        "8" | "d" => Some(Action::Delete),
        "9" => Some(Action::Resize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_letters_agree() {
        assert_eq!(key_to_action("2"), key_to_action("s"));
        assert_eq!(key_to_action("8"), key_to_action("d"));
        assert_eq!(key_to_action("0"), Some(Action::Select));
        assert_eq!(key_to_action("q"), None);
    }
}
