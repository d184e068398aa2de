mod actor;
mod cast;
mod chapters;
mod content;
mod manager;
mod mission;
mod narrative;
mod orchestrator;

pub(crate) use content::StoryContent;
pub(crate) use orchestrator::VoyageGame;
