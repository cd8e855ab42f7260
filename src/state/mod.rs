// Page state: category selection, filters, sort and fetched data for one comparison page
pub mod page;
pub mod selection;

pub use page::{Action, FetchTicket, NavigationMode, PageState, Transition, UrlUpdate};
pub use selection::Selection;
