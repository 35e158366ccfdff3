use reviews::{Attribute, FeatureId, Rating, ReviewApi, ReviewsHandle, UgcUpdate};
use tokio_test::assert_ok;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test]
async fn serves_sample_reviews() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let api = ReviewApi::start(dir.path().join("ugc.json")).unwrap();

    let none = assert_ok!(api.get_reviews(FeatureId::new("Kiel", 0)).await);
    assert!(none.is_empty());

    let coffee = assert_ok!(api.get_reviews(FeatureId::new("Kiel", 1)).await);
    assert_eq!(coffee.reviews[0].text, "Damn good coffee");

    let diner = assert_ok!(api.get_reviews(FeatureId::new("Kiel", 2)).await);
    assert_eq!(diner.attributes[1], Attribute::new("best-meal", "Cherry Pie"));
}

#[tokio::test]
async fn updates_are_stored_and_reloaded() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ugc.json");
    let feature = FeatureId::new("Kiel", 42);
    let update = UgcUpdate {
        rating: Rating::default().with("service", 4.0),
        text: Some("Friendly staff".to_owned()),
        ..Default::default()
    };

    let api = ReviewApi::start(path.clone()).unwrap();
    assert!(assert_ok!(api.get_review_update(feature.clone()).await).is_empty());
    assert_ok!(api.set_review_update(feature.clone(), update.clone()).await);
    assert_eq!(
        assert_ok!(api.get_review_update(feature.clone()).await),
        update
    );
    drop(api);

    let reopened = ReviewApi::start(path).unwrap();
    assert_eq!(assert_ok!(reopened.get_review_update(feature).await), update);
}

#[tokio::test]
async fn broken_file_fails_to_start() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ugc.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(ReviewApi::start(path).is_err());
}
