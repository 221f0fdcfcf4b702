//! Prelude module - common imports for interview-notifier users
//!
//! ```rust
//! use interview_notifier::prelude::*;
//! ```

pub use crate::{
    // Mail
    dispatcher,
    // Tables
    open_store,
    write_template,
    ActivityLog,
    Error,
    Field,
    FileActivityLog,
    MailConfig,
    MailDispatcher,
    Notifier,
    OutgoingMessage,
    PersistOrder,
    Result,
    RowOutcome,
    RunOptions,
    Session,
    SessionReport,
    StateWriter,
    TableStore,
    TemplateConfig,
    TemplateLayout,
    DEFAULT_LOG_FILE,
};
