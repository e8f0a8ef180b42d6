pub mod mock_user_store;
pub mod recording_push_sender;
pub mod test_logging;
