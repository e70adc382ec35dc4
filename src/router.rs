//! Command dispatch
//!
//! Maps every [`VoiceCommand`] to exactly one controller operation.

use crate::controller::Controller;
use crate::error::{DomainError, InteractionError};
use crate::interpreter::VoiceCommand;

/// Run the controller operation for `command`
pub async fn route(controller: &Controller, command: VoiceCommand) -> Result<(), InteractionError> {
    tracing::debug!("Routing {}", command);

    match command {
        VoiceCommand::ReadHeaders { .. } => controller.read_headers(command.header_filter()).await,
        VoiceCommand::ReadLinks { .. } => controller.read_links(command.link_filter()).await,
        VoiceCommand::ReadCurrentElement => controller.read_current_element().await,
        VoiceCommand::ReadNextElement => controller.read_next_element().await,
        VoiceCommand::ReadPreviousElement => controller.read_previous_element().await,
        VoiceCommand::GoToLink => Ok(controller.go_to_link()?),
        VoiceCommand::ReadMain => controller.read_main().await,
        VoiceCommand::SearchMain => Ok(controller.search_main()?),
        VoiceCommand::ReadPageTitle => controller.read_page_title().await,
        VoiceCommand::ReadPageSummary => controller.read_page_summary().await,
        VoiceCommand::GoToPreviousPage => {
            controller.go_to_previous_page();
            Ok(())
        }
        VoiceCommand::GoToNextPage => {
            controller.go_to_next_page();
            Ok(())
        }
        VoiceCommand::GoToHomepage => {
            controller.go_to_homepage();
            Ok(())
        }
        VoiceCommand::Unrecognized { transcript } => {
            tracing::debug!("Unrecognized command {:?}", transcript);
            Err(DomainError::UnknownCommand.into())
        }
    }
}
