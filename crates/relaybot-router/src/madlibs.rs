//! Mad Libs — collects four words, then renders them into a story template.

use thiserror::Error;

/// The story every new session uses.
pub const DEFAULT_TEMPLATE: &str = "Once upon a time, there was a {0} who loved to {1} {2}ly. One day, they decided to go on a {3} adventure.";

/// Word types asked for, in placeholder order.
pub const INPUT_LABELS: [&str; 4] = ["noun", "verb", "adjective", "adverb"];

/// A session method was called out of sequence.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidStateError {
    #[error("mad libs session is already complete")]
    AlreadyComplete,
    #[error("mad libs session is not complete yet ({collected} of {required} inputs)")]
    NotComplete { collected: usize, required: usize },
    #[error("mad libs template has no {{{0}}} placeholder")]
    MissingPlaceholder(usize),
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `n` inputs collected so far.
    Collecting(usize),
    Complete,
}

/// One game of Mad Libs in one channel.
#[derive(Debug, Clone)]
pub struct MadLibsSession {
    template: String,
    inputs: Vec<String>,
}

impl Default for MadLibsSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MadLibsSession {
    /// Start a session on the built-in story.
    pub fn new() -> Self {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    /// Start a session on a custom template. Each of `{0}`..`{3}` should
    /// appear exactly once.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            inputs: Vec::with_capacity(INPUT_LABELS.len()),
        }
    }

    pub fn state(&self) -> SessionState {
        if self.is_complete() {
            SessionState::Complete
        } else {
            SessionState::Collecting(self.inputs.len())
        }
    }

    pub fn is_complete(&self) -> bool {
        self.inputs.len() == INPUT_LABELS.len()
    }

    /// Record the next word.
    pub fn add_input(&mut self, text: impl Into<String>) -> Result<(), InvalidStateError> {
        if self.is_complete() {
            return Err(InvalidStateError::AlreadyComplete);
        }
        self.inputs.push(text.into());
        Ok(())
    }

    /// The word type to ask for next.
    pub fn next_input_label(&self) -> Result<&'static str, InvalidStateError> {
        INPUT_LABELS
            .get(self.inputs.len())
            .copied()
            .ok_or(InvalidStateError::AlreadyComplete)
    }

    /// Fill the template with the collected words.
    ///
    /// Placeholders may appear in any order. Only the first occurrence of
    /// each is replaced, and the inserted words are never scanned again, so a
    /// word like `"{2}"` comes out literally.
    pub fn render_story(&self) -> Result<String, InvalidStateError> {
        if !self.is_complete() {
            return Err(InvalidStateError::NotComplete {
                collected: self.inputs.len(),
                required: INPUT_LABELS.len(),
            });
        }

        // (position in template, placeholder length, input index)
        let mut slots = Vec::with_capacity(self.inputs.len());
        for i in 0..self.inputs.len() {
            let placeholder = format!("{{{i}}}");
            let pos = self
                .template
                .find(&placeholder)
                .ok_or(InvalidStateError::MissingPlaceholder(i))?;
            slots.push((pos, placeholder.len(), i));
        }
        slots.sort_unstable_by_key(|&(pos, _, _)| pos);

        let mut story = String::with_capacity(
            self.template.len() + self.inputs.iter().map(String::len).sum::<usize>(),
        );
        let mut cursor = 0;
        for (pos, len, i) in slots {
            story.push_str(&self.template[cursor..pos]);
            story.push_str(&self.inputs[i]);
            cursor = pos + len;
        }
        story.push_str(&self.template[cursor..]);

        Ok(story)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(words: [&str; 4]) -> MadLibsSession {
        let mut session = MadLibsSession::new();
        for w in words {
            session.add_input(w).unwrap();
        }
        session
    }

    #[test]
    fn test_state_progression() {
        let mut session = MadLibsSession::new();
        assert_eq!(session.state(), SessionState::Collecting(0));
        assert_eq!(session.next_input_label(), Ok("noun"));

        session.add_input("dog").unwrap();
        assert_eq!(session.state(), SessionState::Collecting(1));
        assert_eq!(session.next_input_label(), Ok("verb"));

        session.add_input("jump").unwrap();
        assert_eq!(session.next_input_label(), Ok("adjective"));

        session.add_input("happi").unwrap();
        assert_eq!(session.next_input_label(), Ok("adverb"));
        assert!(!session.is_complete());

        session.add_input("fishing").unwrap();
        assert!(session.is_complete());
        assert_eq!(session.state(), SessionState::Complete);
    }

    #[test]
    fn test_render_story() {
        let session = completed(["dog", "jump", "happi", "fishing"]);
        assert_eq!(
            session.render_story().unwrap(),
            "Once upon a time, there was a dog who loved to jump happily. One day, they decided to go on a fishing adventure."
        );
    }

    #[test]
    fn test_fifth_input_fails() {
        let mut session = completed(["dog", "jump", "happi", "fishing"]);
        assert_eq!(
            session.add_input("extra"),
            Err(InvalidStateError::AlreadyComplete)
        );
        assert_eq!(
            session.next_input_label(),
            Err(InvalidStateError::AlreadyComplete)
        );
    }

    #[test]
    fn test_render_before_complete_fails() {
        let mut session = MadLibsSession::new();
        session.add_input("dog").unwrap();
        assert_eq!(
            session.render_story(),
            Err(InvalidStateError::NotComplete {
                collected: 1,
                required: 4
            })
        );
    }

    #[test]
    fn test_placeholder_like_input_not_substituted_again() {
        let session = completed(["{1}", "{2}", "{3}", "x"]);
        let story = session.render_story().unwrap();
        assert!(story.starts_with("Once upon a time, there was a {1} who loved to {2} {3}ly."));
        assert!(story.ends_with("go on a x adventure."));
    }

    #[test]
    fn test_custom_template() {
        let mut session = MadLibsSession::with_template("{0}-{1}-{2}-{3}");
        for w in ["a", "b", "c", "d"] {
            session.add_input(w).unwrap();
        }
        assert_eq!(session.render_story().unwrap(), "a-b-c-d");
    }

    #[test]
    fn test_rendered_story_has_no_placeholders() {
        let story = completed(["cat", "sing", "loud", "space"])
            .render_story()
            .unwrap();
        for i in 0..4 {
            assert!(!story.contains(&format!("{{{i}}}")));
        }
    }

    #[test]
    fn test_out_of_order_template() {
        let mut session = MadLibsSession::with_template("{3} then {2} then {1} then {0}");
        for w in ["a", "b", "c", "d"] {
            session.add_input(w).unwrap();
        }
        assert_eq!(session.render_story().unwrap(), "d then c then b then a");
    }

    #[test]
    fn test_missing_placeholder_fails() {
        let mut session = MadLibsSession::with_template("{0} and {1} and {3}");
        for w in ["a", "b", "c", "d"] {
            session.add_input(w).unwrap();
        }
        assert_eq!(
            session.render_story(),
            Err(InvalidStateError::MissingPlaceholder(2))
        );
    }
}
