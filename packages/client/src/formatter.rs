//! Message formatting utilities for client display.

use crossfire_server::infrastructure::dto::websocket::DiffEntry;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the connection banner
    pub fn format_connected(server_url: &str) -> String {
        format!("Connected to coordinator at {}\n", server_url)
    }

    /// Format the result of joining a room
    ///
    /// # Arguments
    ///
    /// * `room` - The room that was joined
    /// * `is_host` - Whether this client was assigned the host role
    pub fn format_setup_success(room: &str, is_host: bool) -> String {
        let mut output = format!("Successfully joined room '{}'.\n", room);
        if is_host {
            output.push_str("You are the host.\n");
            output.push_str("Press ENTER to start the test run when all users have joined.\n");
        } else {
            output.push_str(
                "You are a participant. Waiting for the host to start the test run...\n",
            );
        }
        output
    }

    /// Format a membership change
    pub fn format_user_update(members: usize) -> String {
        format!("There are now {} user(s) in the room.\n", members)
    }

    /// Format the confirmation printed once the host starts the run
    pub fn format_test_run_started() -> String {
        "Test run started. Generating first test case...\n".to_string()
    }

    /// Format the notice printed when a test case arrives
    pub fn format_test_case_received() -> String {
        "Received new test case. Running program...\n".to_string()
    }

    /// Format a matching round
    ///
    /// # Arguments
    ///
    /// * `remaining` - Matching rounds still required; `0` means the session is complete
    pub fn format_all_match(remaining: u32) -> String {
        let mut output = String::from("\nOutputs match!\n");
        output.push_str("--------------------------------------\n");
        if remaining == 0 {
            output.push_str("All required rounds matched. Session complete.\n");
        } else {
            output.push_str(&format!(
                "{} more matching round(s) required. Waiting for next test case from host...\n",
                remaining
            ));
        }
        output
    }

    /// Format the mismatch report
    ///
    /// # Arguments
    ///
    /// * `input` - The failing test case
    /// * `diffs` - One patch per pair of users whose outputs differ
    pub fn format_diff_report(input: &str, diffs: &[DiffEntry]) -> String {
        let mut output = String::from("\n--- MISMATCH FOUND! ---\n");
        output.push_str("\nFailing Test Case Input:\n");
        push_block(&mut output, input);
        output.push_str("\nPairwise Diffs:\n");

        for entry in diffs {
            output.push_str(&format!(
                "\n--- Diff between user {} and user {} ---\n",
                entry.users[0], entry.users[1]
            ));
            push_block(&mut output, &entry.patch);
        }

        output.push_str("\n--- END OF SESSION ---\n");
        output
    }

    /// Format a fatal room error
    pub fn format_error(message: &str) -> String {
        format!("\nAn error occurred: {}\n", message)
    }
}

/// Append `text`, terminating it with exactly one newline
fn push_block(output: &mut String, text: &str) {
    output.push_str(text);
    if !text.ends_with('\n') {
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_setup_success_as_host() {
        // テスト項目: ホストには ENTER で開始する案内が表示される
        // given (前提条件):
        let room = "r1";

        // when (操作):
        let result = MessageFormatter::format_setup_success(room, true);

        // then (期待する結果):
        assert_eq!(
            result,
            "Successfully joined room 'r1'.\n\
             You are the host.\n\
             Press ENTER to start the test run when all users have joined.\n"
        );
    }

    #[test]
    fn test_format_setup_success_as_participant() {
        // テスト項目: 参加者にはホストを待つ案内が表示される
        // given (前提条件):
        let room = "r1";

        // when (操作):
        let result = MessageFormatter::format_setup_success(room, false);

        // then (期待する結果):
        assert!(result.contains("You are a participant."));
        assert!(!result.contains("Press ENTER"));
    }

    #[test]
    fn test_format_user_update() {
        // テスト項目: メンバー数の変化が表示される
        // given (前提条件):
        let members = 3;

        // when (操作):
        let result = MessageFormatter::format_user_update(members);

        // then (期待する結果):
        assert_eq!(result, "There are now 3 user(s) in the room.\n");
    }

    #[test]
    fn test_format_all_match_with_rounds_left() {
        // テスト項目: 残りラウンドがある場合は次のテストケースを待つ旨が表示される
        // given (前提条件):
        let remaining = 9;

        // when (操作):
        let result = MessageFormatter::format_all_match(remaining);

        // then (期待する結果):
        assert!(result.starts_with("\nOutputs match!\n"));
        assert!(result.contains("9 more matching round(s) required."));
    }

    #[test]
    fn test_format_all_match_completed() {
        // テスト項目: 残りが 0 の場合はセッション完了が表示される
        // given (前提条件):
        let remaining = 0;

        // when (操作):
        let result = MessageFormatter::format_all_match(remaining);

        // then (期待する結果):
        assert!(result.contains("Session complete."));
        assert!(!result.contains("Waiting for next test case"));
    }

    #[test]
    fn test_format_diff_report() {
        // テスト項目: 不一致レポートに入力と各ペアの差分が表示される
        // given (前提条件):
        let diffs = vec![DiffEntry {
            users: ["aaaa".to_string(), "bbbb".to_string()],
            patch: "@@ -1,2 +1,1 @@\n-5\n-3\n+8\n".to_string(),
        }];

        // when (操作):
        let result = MessageFormatter::format_diff_report("5\n3\n", &diffs);

        // then (期待する結果):
        assert_eq!(
            result,
            "\n--- MISMATCH FOUND! ---\n\
             \nFailing Test Case Input:\n\
             5\n3\n\
             \nPairwise Diffs:\n\
             \n--- Diff between user aaaa and user bbbb ---\n\
             @@ -1,2 +1,1 @@\n-5\n-3\n+8\n\
             \n--- END OF SESSION ---\n"
        );
    }

    #[test]
    fn test_format_diff_report_terminates_unterminated_input() {
        // テスト項目: 改行で終わらない入力でも次のセクションと混ざらない
        // given (前提条件):
        let input = "42";

        // when (操作):
        let result = MessageFormatter::format_diff_report(input, &[]);

        // then (期待する結果):
        assert!(result.contains("Failing Test Case Input:\n42\n\nPairwise Diffs:\n"));
    }

    #[test]
    fn test_format_error() {
        // テスト項目: エラーメッセージが表示される
        // given (前提条件):
        let message = "The host has disconnected.";

        // when (操作):
        let result = MessageFormatter::format_error(message);

        // then (期待する結果):
        assert_eq!(result, "\nAn error occurred: The host has disconnected.\n");
    }
}
