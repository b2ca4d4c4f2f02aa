use std::collections::BTreeMap;

use catalog_core::model::{
    ArticleId, Difficulty, Item, ItemId, LearningArticle, QuestionId, QuizQuestion,
    SavedRelation, UserId, UserProgress,
};
use catalog_core::time::fixed_now;
use chrono::Duration;
use storage::repository::{
    ArticleRepository, ItemRepository, ProgressRepository, QuizRepository, SavedItemRepository,
    StatisticsRepository, StorageError,
};
use storage::sqlite::SqliteRepository;

async fn open(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:memdb_{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn build_item(id: u64, category: &str) -> Item {
    Item::new(
        ItemId::new(id),
        format!("Tool {id}"),
        "Does things",
        category,
        "Free",
        "https://tools.example.com/t",
    )
    .unwrap()
}

fn build_article(id: u64) -> LearningArticle {
    LearningArticle::new(
        ArticleId::new(id),
        format!("Article {id}"),
        "Ada",
        "Body text",
        Difficulty::Intermediate,
        "https://learn.example.com/a",
    )
    .unwrap()
}

fn build_question(article: u64, id: u64) -> QuizQuestion {
    let options: BTreeMap<String, String> = [("a", "Tensor"), ("b", "Matrix"), ("c", "Scalar")]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
    QuizQuestion::new(
        QuestionId::new(id),
        ArticleId::new(article),
        format!("Question {id}?"),
        options,
        "b",
    )
    .unwrap()
}

#[tokio::test]
async fn items_and_articles_roundtrip() {
    let repo = open("catalog_roundtrip").await;
    repo.upsert_item(&build_item(2, "Code")).await.unwrap();
    repo.upsert_item(&build_item(1, "Text")).await.unwrap();
    repo.upsert_article(&build_article(9)).await.unwrap();

    let items = repo.list_items().await.unwrap();
    let ids: Vec<u64> = items.iter().map(|i| i.id().value()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(items[1].category(), "Code");

    let article = repo.get_article(ArticleId::new(9)).await.unwrap().unwrap();
    assert_eq!(article.difficulty(), Difficulty::Intermediate);
    assert_eq!(article.author(), "Ada");
    assert!(repo.get_article(ArticleId::new(10)).await.unwrap().is_none());

    let picked = repo
        .items_by_ids(&[ItemId::new(2), ItemId::new(44)])
        .await
        .unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].title(), "Tool 2");
}

#[tokio::test]
async fn saved_relations_are_unique_and_counted() {
    let repo = open("saved_relations").await;
    for id in 1..=3 {
        repo.upsert_item(&build_item(id, "Text")).await.unwrap();
    }
    let (alice, bob) = (UserId::new_v4(), UserId::new_v4());
    let now = fixed_now();

    repo.insert_saved(&SavedRelation::new(alice, ItemId::new(2), now + Duration::minutes(1)))
        .await
        .unwrap();
    repo.insert_saved(&SavedRelation::new(alice, ItemId::new(3), now))
        .await
        .unwrap();
    repo.insert_saved(&SavedRelation::new(bob, ItemId::new(2), now))
        .await
        .unwrap();

    let err = repo
        .insert_saved(&SavedRelation::new(alice, ItemId::new(2), now))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    assert!(repo.is_saved(alice, ItemId::new(2)).await.unwrap());
    assert_eq!(repo.count_for(ItemId::new(2)).await.unwrap(), 2);

    let counts = repo
        .counts_for(&[ItemId::new(1), ItemId::new(2), ItemId::new(3)])
        .await
        .unwrap();
    assert_eq!(counts.get(&ItemId::new(1)), 0);
    assert_eq!(counts.get(&ItemId::new(2)), 2);
    assert_eq!(counts.get(&ItemId::new(3)), 1);

    assert_eq!(
        repo.saved_item_ids(alice).await.unwrap(),
        vec![ItemId::new(3), ItemId::new(2)]
    );

    assert!(repo.delete_saved(alice, ItemId::new(2)).await.unwrap());
    assert!(!repo.delete_saved(alice, ItemId::new(2)).await.unwrap());
    assert_eq!(repo.count_for(ItemId::new(2)).await.unwrap(), 1);
}

#[tokio::test]
async fn saving_unknown_item_is_not_found() {
    let repo = open("saved_unknown").await;
    let err = repo
        .insert_saved(&SavedRelation::new(UserId::new_v4(), ItemId::new(77), fixed_now()))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn quiz_questions_keep_options_and_order() {
    let repo = open("quiz_questions").await;
    repo.upsert_article(&build_article(1)).await.unwrap();
    repo.upsert_question(&build_question(1, 2)).await.unwrap();
    repo.upsert_question(&build_question(1, 1)).await.unwrap();

    let questions = repo.questions_for_article(ArticleId::new(1)).await.unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].id(), QuestionId::new(1));
    assert_eq!(questions[0].options().len(), 3);
    assert_eq!(questions[0].option_label("b"), Some("Matrix"));
    assert!(questions[1].is_correct("b"));

    assert!(
        repo.questions_for_article(ArticleId::new(2))
            .await
            .unwrap()
            .is_empty()
    );
}

fn submission(user: UserId, article: u64, passed: bool) -> UserProgress {
    UserProgress {
        user_id: user,
        article_id: ArticleId::new(article),
        test_passed: passed,
        updated_at: fixed_now(),
    }
}

#[tokio::test]
async fn statistics_accumulate_attempts_and_passes() {
    let repo = open("statistics").await;
    repo.upsert_article(&build_article(5)).await.unwrap();
    let article = ArticleId::new(5);
    assert!(repo.get_statistics(article).await.unwrap().is_none());

    for n in 0..8 {
        repo.record_submission(&submission(UserId::new_v4(), 5, n % 2 == 0))
            .await
            .unwrap();
    }

    let stats = repo.get_statistics(article).await.unwrap().unwrap();
    assert_eq!(stats.total_attempts(), 8);
    assert_eq!(stats.successful_passes(), 4);
    assert_eq!(stats.pass_rate(), 50);
}

#[tokio::test]
async fn progress_is_overwritten_by_latest_attempt() {
    let repo = open("progress").await;
    repo.upsert_article(&build_article(1)).await.unwrap();
    repo.upsert_article(&build_article(2)).await.unwrap();
    let user = UserId::new_v4();

    let first = submission(user, 1, true);
    repo.record_submission(&first).await.unwrap();
    let stats = repo
        .record_submission(&UserProgress {
            test_passed: false,
            updated_at: fixed_now() + Duration::hours(1),
            ..first.clone()
        })
        .await
        .unwrap();
    assert_eq!((stats.total_attempts(), stats.successful_passes()), (2, 1));
    repo.record_submission(&submission(user, 2, true)).await.unwrap();

    let latest = repo
        .get_progress(user, ArticleId::new(1))
        .await
        .unwrap()
        .unwrap();
    assert!(!latest.test_passed);
    assert_eq!(latest.updated_at, fixed_now() + Duration::hours(1));

    let all = repo.list_progress(user).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].article_id, ArticleId::new(2));
    assert!(repo.list_progress(UserId::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_submission_leaves_no_rows() {
    let repo = open("rejected_submission").await;
    let user = UserId::new_v4();

    let err = repo
        .record_submission(&submission(user, 9, true))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
    assert!(repo.get_progress(user, ArticleId::new(9)).await.unwrap().is_none());
    assert!(repo.get_statistics(ArticleId::new(9)).await.unwrap().is_none());
}
