//! Integration test: state survives closing and reopening the on-disk store.

use fitroom_core::{
    AccessoryType, ClothingType, ImageRef, LatencyProfile, Measurements, SessionPhase, SledStore,
    Studio, StudioConfig, StudioParts,
};
use std::path::Path;
use std::sync::Arc;

fn config(dir: &Path) -> StudioConfig {
    StudioConfig {
        data_dir: dir.join("fitroom"),
        latency: LatencyProfile::instant(),
        ..StudioConfig::default()
    }
}

#[tokio::test]
async fn asset_collection_reloads_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());

    let created = {
        let studio = Studio::open(&cfg).expect("open studio");
        let mut created = Vec::new();
        for (i, kind) in [ClothingType::Dress, ClothingType::Pants, ClothingType::Jacket, ClothingType::Dress]
            .into_iter()
            .enumerate()
        {
            let item = studio
                .clothing()
                .create(ImageRef::new(format!("file:///photos/{}.png", i)), &format!("Look {}", i), kind)
                .await
                .unwrap();
            created.push(item);
        }
        created
    };

    let reopened = Studio::open(&cfg).expect("reopen studio");
    assert_eq!(reopened.clothing().list_all(), created);
    assert!(reopened.accessories().list_all().is_empty());
}

#[tokio::test]
async fn avatar_session_reloads_ready() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let measurements = Measurements { height: 182.0, weight: 81.5, ..Measurements::default() };

    {
        let studio = Studio::open(&cfg).unwrap();
        studio
            .session()
            .create_or_replace("file:///me.jpg".into(), measurements.clone())
            .await
            .unwrap();
        studio
            .accessories()
            .create("file:///cap.jpg".into(), "Red Cap", AccessoryType::Cap)
            .await
            .unwrap();
    }

    let studio = Studio::open(&cfg).unwrap();
    assert_eq!(studio.session().phase(), SessionPhase::Ready);
    assert_eq!(studio.session().avatar_image(), Some(ImageRef::from("file:///me.jpg")));
    assert_eq!(studio.session().measurements(), Some(measurements));
    assert_eq!(studio.accessories().list_all().len(), 1);
}

#[tokio::test]
async fn namespaces_do_not_share_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared");

    {
        let store = SledStore::open_path(&path, "alice").unwrap();
        let studio = Studio::from_parts(StudioParts::new(Arc::new(store), LatencyProfile::instant()));
        studio
            .session()
            .create_or_replace("alice.png".into(), Measurements::default())
            .await
            .unwrap();
    }

    let store = SledStore::open_path(&path, "bob").unwrap();
    let studio = Studio::from_parts(StudioParts::new(Arc::new(store), LatencyProfile::instant()));
    assert_eq!(studio.session().avatar_image(), None);
    assert_eq!(studio.session().phase(), SessionPhase::NoAvatar);
}
