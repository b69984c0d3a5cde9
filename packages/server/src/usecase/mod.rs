//! UseCase 層
//!
//! 受信イベントごとに 1 つのユースケースと、ラウンドを駆動する [`RoundController`] で構成されます。

mod connect_participant;
mod disconnect_participant;
mod error;
mod get_rooms;
mod report_error;
mod round_controller;
mod setup_room;
mod start_testing;
mod submit_input;
mod submit_output;

#[cfg(test)]
mod test_support;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{GetRoomDetailError, RoomEventError, SetupRoomError};
pub use get_rooms::{GetRoomDetailUseCase, GetRoomsUseCase};
pub use report_error::ReportErrorUseCase;
pub use round_controller::{HOST_DISCONNECTED_MESSAGE, ROUND_TIMED_OUT_MESSAGE, RoundController};
pub use setup_room::SetupRoomUseCase;
pub use start_testing::StartTestingUseCase;
pub use submit_input::SubmitInputUseCase;
pub use submit_output::SubmitOutputUseCase;
