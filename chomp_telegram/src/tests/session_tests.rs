use crate::session::SessionStore;
use crate::tests::test_utils::{chomp_user, question};
use chomp_models::session::PendingAnswer;

#[tokio::test]
async fn sessions_are_created_on_first_write() {
    let sessions = SessionStore::new();
    assert!(sessions.get(1).await.is_none());

    sessions
        .update(1, |session| session.user = Some(chomp_user("user-1")))
        .await;

    assert!(sessions.get(1).await.unwrap().user.is_some());
}

#[tokio::test]
async fn chats_never_see_each_others_state() {
    let sessions = SessionStore::new();

    sessions
        .update(1, |session| session.user = Some(chomp_user("user-1")))
        .await;
    sessions
        .update(2, |session| session.user = Some(chomp_user("user-2")))
        .await;
    sessions
        .update(1, |session| {
            session.pending_answer = Some(PendingAnswer::new(question()))
        })
        .await;

    let second = sessions.get(2).await.unwrap();
    assert_eq!(second.user.unwrap().id, "user-2");
    assert!(second.pending_answer.is_none());
}

#[tokio::test]
async fn updates_are_read_modify_write_per_key() {
    let sessions = SessionStore::new();

    sessions
        .update(1, |session| session.user = Some(chomp_user("user-1")))
        .await;
    sessions
        .update(1, |session| {
            session.pending_answer = Some(PendingAnswer::new(question()))
        })
        .await;

    let session = sessions.get(1).await.unwrap();
    assert!(session.user.is_some());
    assert!(session.pending_answer.is_some());
}
