pub mod manager;
pub mod memory;
pub mod notifier;
pub mod store;
pub mod supabase;

pub use manager::WaitlistManager;
pub use memory::InMemoryWaitlistStore;
pub use notifier::{LoggingNotifier, WaitlistNotifier};
pub use store::WaitlistStore;
pub use supabase::SupabaseWaitlistStore;
