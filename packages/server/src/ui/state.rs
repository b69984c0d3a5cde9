//! Server state shared by every handler.

use std::sync::Arc;

use crate::usecase::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, GetRoomDetailUseCase,
    GetRoomsUseCase, ReportErrorUseCase, SetupRoomUseCase, StartTestingUseCase,
    SubmitInputUseCase, SubmitOutputUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（接続確立のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SetupRoomUseCase（ルーム参加のユースケース）
    pub setup_room_usecase: Arc<SetupRoomUseCase>,
    /// StartTestingUseCase（テスト開始のユースケース）
    pub start_testing_usecase: Arc<StartTestingUseCase>,
    /// SubmitInputUseCase（テストケース受信のユースケース）
    pub submit_input_usecase: Arc<SubmitInputUseCase>,
    /// SubmitOutputUseCase（出力受信のユースケース）
    pub submit_output_usecase: Arc<SubmitOutputUseCase>,
    /// ReportErrorUseCase（エラー報告のユースケース）
    pub report_error_usecase: Arc<ReportErrorUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}
