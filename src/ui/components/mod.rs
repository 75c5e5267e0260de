mod command_input;
mod filter_bar;
mod input;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use filter_bar::FilterBar;
pub use input::{InputResult, TextInput};
pub use search_input::{SearchEvent, SearchInput};

/// What a component did with a key offered to it by its view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the view to do
  Handled,
  /// Consumed, and the view should react to `T`
  Event(T),
  /// Not for this component
  NotHandled,
}
