pub mod artifacts;
pub mod credentials;
pub mod envelope;
pub mod session;

// Re-export the commonly used models so callers can do
// "use crate::models::{Session, SessionData, Profile};"
pub use artifacts::{
    ChatMessage, ItineraryQuery, RecipeQuery, SaveChat, SaveRecipe, SaveTravel, SavedRecipe,
    SavedTravel,
};
pub use credentials::{LoginRequest, RegisterRequest};
pub use envelope::{ApiEnvelope, AuthResponse};
pub use session::{Profile, Session, SessionData};
