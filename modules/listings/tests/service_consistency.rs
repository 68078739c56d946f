mod common;

use anyhow::Result;
use common::{upload, TestCtx};

use listings::contract::model::{
    ListingPatch, NewListing, NewReview, ProfilePatch, ReviewPatch, WishlistChange,
    PLACEHOLDER_IMAGE_URL,
};
use listings::domain::error::DomainError;
use listings::domain::repo::RefSet;
use listings::domain::service::ServiceConfig;
use uuid::Uuid;

fn review(listing: Uuid, rating: i32, comment: &str) -> NewReview {
    NewReview {
        listing,
        rating,
        comment: comment.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_then_login() -> Result<()> {
    let ctx = TestCtx::new().await;

    let registered = ctx.service.register("alice", "pw1").await?;
    assert_eq!(registered.user.username.as_deref(), Some("alice"));
    assert!(registered.user.password_hash().is_some_and(|h| h != "pw1"));

    let session = ctx.service.login("alice", "pw1").await?;
    assert!(!session.token.is_empty());
    let me = ctx.service.authenticate(&session.token).await?;
    assert_eq!(me.id, registered.user.id);

    let err = ctx.service.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidCredentials));
    let err = ctx.service.login("nobody", "pw1").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidCredentials));
    Ok(())
}

#[tokio::test]
async fn register_rejects_duplicates_and_blanks() -> Result<()> {
    let ctx = TestCtx::new().await;
    ctx.service.register("alice", "pw").await?;

    let err = ctx.service.register("alice", "other").await.unwrap_err();
    assert!(matches!(err, DomainError::UsernameTaken { .. }));

    let err = ctx.service.register("  ", "pw").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    let err = ctx.service.register("bob", "").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    Ok(())
}

#[tokio::test]
async fn bogus_token_is_unauthenticated() {
    let ctx = TestCtx::new().await;
    let err = ctx.service.authenticate("not-a-token").await.unwrap_err();
    assert!(matches!(err, DomainError::Unauthenticated { .. }));
}

#[tokio::test]
async fn google_sign_in_provisions_then_refreshes() -> Result<()> {
    let ctx = TestCtx::new().await;
    ctx.identities
        .add("tok-1", "g-123", Some("alice@gmail.com"), Some("Alice"));

    let first = ctx.service.authenticate_external("tok-1").await?;
    assert_eq!(first.user.google_id(), Some("g-123"));
    assert_eq!(first.user.username.as_deref(), Some("alice"));
    assert_eq!(first.user.gmail.as_deref(), Some("alice@gmail.com"));
    assert_eq!(first.user.name.as_deref(), Some("Alice"));
    assert!(first.user.password_hash().is_none());

    ctx.identities
        .add("tok-2", "g-123", Some("alice@gmail.com"), Some("Alice B."));
    let second = ctx.service.authenticate_external("tok-2").await?;
    assert_eq!(second.user.id, first.user.id);
    assert_eq!(second.user.name.as_deref(), Some("Alice B."));

    // Google-only accounts cannot log in with a password.
    let err = ctx.service.login("alice", "").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidCredentials));
    Ok(())
}

#[tokio::test]
async fn google_usernames_are_deduplicated() -> Result<()> {
    let ctx = TestCtx::new().await;
    ctx.service.register("sam", "pw").await?;
    ctx.identities.add("a", "g-1", Some("sam@gmail.com"), None);
    ctx.identities.add("b", "g-2", Some("sam@example.org"), None);
    ctx.identities.add("c", "g-3", None, None);

    let a = ctx.service.authenticate_external("a").await?;
    let b = ctx.service.authenticate_external("b").await?;
    let c = ctx.service.authenticate_external("c").await?;
    assert_eq!(a.user.username.as_deref(), Some("sam1"));
    assert_eq!(b.user.username.as_deref(), Some("sam2"));
    assert_eq!(c.user.username.as_deref(), Some("user"));
    Ok(())
}

#[tokio::test]
async fn google_sign_in_errors() {
    let ctx = TestCtx::new().await;
    let err = ctx.service.authenticate_external(" ").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    let err = ctx.service.authenticate_external("forged").await.unwrap_err();
    assert!(matches!(err, DomainError::IdentityRejected { .. }));
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_without_images_gets_placeholder() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;

    let listing = ctx
        .service
        .create_listing(
            u1,
            NewListing {
                title: "Cabin".into(),
                price: Some(100.0),
                ..Default::default()
            },
            Vec::new(),
        )
        .await?;
    assert_eq!(listing.images, vec![PLACEHOLDER_IMAGE_URL.to_string()]);
    assert_eq!(listing.owner, u1);
    assert!(ctx.images.uploaded.lock().is_empty());
    Ok(())
}

#[tokio::test]
async fn uploaded_images_keep_their_order() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;

    let listing = ctx
        .service
        .create_listing(
            u1,
            NewListing {
                title: "Loft".into(),
                price: Some(50.0),
                ..Default::default()
            },
            vec![upload("a.png"), upload("b.png")],
        )
        .await?;
    assert_eq!(
        listing.images,
        vec![
            "https://img.test/1/a.png".to_string(),
            "https://img.test/2/b.png".to_string()
        ]
    );
    Ok(())
}

#[tokio::test]
async fn create_listing_validates_input() -> Result<()> {
    let ctx = TestCtx::with_config(ServiceConfig {
        max_images_per_listing: 1,
        ..Default::default()
    })
    .await;
    let (u1, _) = ctx.user("u1").await;

    let blank_title = NewListing {
        title: " ".into(),
        price: Some(1.0),
        ..Default::default()
    };
    let no_price = NewListing {
        title: "Hut".into(),
        ..Default::default()
    };
    let negative = NewListing {
        title: "Hut".into(),
        price: Some(-5.0),
        ..Default::default()
    };
    for bad in [blank_title, no_price, negative] {
        let err = ctx
            .service
            .create_listing(u1, bad, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }), "{err}");
    }

    let too_many = ctx
        .service
        .create_listing(
            u1,
            NewListing {
                title: "Hut".into(),
                price: Some(1.0),
                ..Default::default()
            },
            vec![upload("a.png"), upload("b.png")],
        )
        .await
        .unwrap_err();
    assert!(matches!(too_many, DomainError::Validation { .. }));
    assert!(ctx.images.uploaded.lock().is_empty());

    assert!(ctx.service.search_listings(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_upload_creates_nothing() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    *ctx.images.fail.lock() = true;

    let err = ctx
        .service
        .create_listing(
            u1,
            NewListing {
                title: "Hut".into(),
                price: Some(1.0),
                ..Default::default()
            },
            vec![upload("a.png")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Upstream { .. }));
    assert!(ctx.service.search_listings(None).await?.is_empty());
    assert!(ctx.refs(RefSet::UserListings, u1).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn every_listing_is_in_its_owners_set() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let (u2, _) = ctx.user("u2").await;

    let a = ctx.listing(u1, "A").await;
    let b = ctx.listing(u2, "B").await;
    let c = ctx.listing(u1, "C").await;

    for listing in ctx.service.search_listings(None).await? {
        let owned = ctx.refs(RefSet::UserListings, listing.owner).await;
        assert!(owned.contains(&listing.id));
    }
    assert_eq!(ctx.refs(RefSet::UserListings, u1).await, vec![a, c]);
    assert_eq!(ctx.refs(RefSet::UserListings, u2).await, vec![b]);

    let owned: Vec<Uuid> = ctx
        .service
        .list_owned_listings(u1)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(owned, vec![a, c]);
    Ok(())
}

#[tokio::test]
async fn get_listing_missing_is_not_found() {
    let ctx = TestCtx::new().await;
    let err = ctx.service.get_listing(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::ListingNotFound { .. }));
}

#[tokio::test]
async fn non_owner_update_is_forbidden_and_changes_nothing() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let (u2, _) = ctx.user("u2").await;
    let id = ctx.listing(u1, "Cabin").await;
    let before = ctx.service.get_listing(id).await?;

    let err = ctx
        .service
        .update_listing(
            id,
            u2,
            ListingPatch {
                title: Some("Hijacked".into()),
                price: Some(1.0),
                ..Default::default()
            },
            vec!["https://evil.test/x.png".into()],
            vec![upload("x.png")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));
    assert_eq!(ctx.service.get_listing(id).await?, before);
    assert!(ctx.images.uploaded.lock().is_empty());

    let err = ctx
        .service
        .update_listing(Uuid::new_v4(), u1, ListingPatch::default(), vec![], vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ListingNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn owner_update_applies_only_supplied_fields() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let created = ctx
        .service
        .create_listing(
            u1,
            NewListing {
                title: "Cabin".into(),
                description: Some("Cosy".into()),
                price: Some(100.0),
                location: Some("Manali".into()),
                country: Some("India".into()),
                coordinates: None,
            },
            vec![upload("a.png")],
        )
        .await?;

    // Blank title/location are ignored, lone lat is ignored, images untouched.
    let updated = ctx
        .service
        .update_listing(
            created.id,
            u1,
            ListingPatch {
                title: Some("  ".into()),
                price: Some(120.0),
                location: Some("".into()),
                lat: Some(32.2),
                ..Default::default()
            },
            vec![],
            vec![],
        )
        .await?;
    assert_eq!(updated.title, "Cabin");
    assert_eq!(updated.price, 120.0);
    assert_eq!(updated.location.as_deref(), Some("Manali"));
    assert_eq!(updated.description.as_deref(), Some("Cosy"));
    assert!(updated.coordinates.is_none());
    assert_eq!(updated.images, created.images);

    // Kept images come first, new uploads after.
    let updated = ctx
        .service
        .update_listing(
            created.id,
            u1,
            ListingPatch {
                lat: Some(32.2),
                lng: Some(77.1),
                ..Default::default()
            },
            created.images.clone(),
            vec![upload("b.png")],
        )
        .await?;
    assert_eq!(updated.images.len(), 2);
    assert_eq!(updated.images[0], created.images[0]);
    assert_eq!(updated.images[1], "https://img.test/2/b.png");
    let coords = updated.coordinates.expect("coordinates");
    assert_eq!((coords.lat, coords.lng), (32.2, 77.1));

    assert_eq!(ctx.service.get_listing(created.id).await?, updated);
    Ok(())
}

#[tokio::test]
async fn search_matches_any_field_case_insensitively() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;

    let mk = |title: &str, description: Option<&str>, location: &str, country: &str| NewListing {
        title: title.into(),
        description: description.map(str::to_string),
        price: Some(10.0),
        location: Some(location.into()),
        country: Some(country.into()),
        coordinates: None,
    };
    let beach = ctx
        .service
        .create_listing(u1, mk("Beach Hut", None, "Goa", "India"), vec![])
        .await?;
    let chalet = ctx
        .service
        .create_listing(
            u1,
            mk("Chalet", Some("Near the BEACH promenade"), "Zermatt", "Switzerland"),
            vec![],
        )
        .await?;
    let flat = ctx
        .service
        .create_listing(u1, mk("Flat 100%", None, "Paris", "France"), vec![])
        .await?;

    let ids = |v: Vec<listings::contract::model::Listing>| v.into_iter().map(|l| l.id).collect::<Vec<_>>();

    assert_eq!(
        ids(ctx.service.search_listings(None).await?),
        vec![beach.id, chalet.id, flat.id]
    );
    assert_eq!(ids(ctx.service.search_listings(Some("")).await?).len(), 3);
    assert_eq!(
        ids(ctx.service.search_listings(Some("beach")).await?),
        vec![beach.id, chalet.id]
    );
    assert_eq!(ids(ctx.service.search_listings(Some("sWiTz")).await?), vec![chalet.id]);
    assert_eq!(ids(ctx.service.search_listings(Some("india")).await?), vec![beach.id]);
    // Wildcards in the query are literal.
    assert_eq!(ids(ctx.service.search_listings(Some("0%")).await?), vec![flat.id]);
    assert!(ctx.service.search_listings(Some("_")).await?.is_empty());
    assert!(ctx.service.search_listings(Some("a.*z")).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn search_folds_non_ascii_case() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let chalet = ctx
        .service
        .create_listing(
            u1,
            NewListing {
                title: "ÉTÉ Chalet".into(),
                price: Some(200.0),
                location: Some("Zürich".into()),
                country: Some("Schweiz".into()),
                description: Some("Blick auf den SEE".into()),
                coordinates: None,
            },
            vec![],
        )
        .await?;

    let found = ctx.service.search_listings(Some("été")).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, chalet.id);
    assert_eq!(found[0].title, "ÉTÉ Chalet");
    assert_eq!(ctx.service.search_listings(Some("ZÜRICH")).await?.len(), 1);
    assert_eq!(
        ctx.service.get_suggestions("été").await?,
        vec!["Schweiz", "Zürich", "ÉTÉ Chalet"]
    );

    // Edits refresh the folded columns.
    ctx.service
        .update_listing(
            chalet.id,
            u1,
            ListingPatch {
                title: Some("Winter Chalet".into()),
                price: Some(200.0),
                ..Default::default()
            },
            vec![],
            vec![],
        )
        .await?;
    assert!(ctx.service.search_listings(Some("été")).await?.is_empty());
    assert!(ctx.service.get_suggestions("été").await?.is_empty());
    assert_eq!(ctx.service.search_listings(Some("WINTER")).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn suggestions_are_distinct_and_sorted() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    for (title, location) in [("Goa Villa", "Goa"), ("Goa Shack", "Goa"), ("Flat", "Paris")] {
        ctx.service
            .create_listing(
                u1,
                NewListing {
                    title: title.into(),
                    price: Some(1.0),
                    location: Some(location.into()),
                    country: Some("India".into()),
                    description: Some("goa mention only in description".into()),
                    coordinates: None,
                },
                vec![],
            )
            .await?;
    }

    let got = ctx.service.get_suggestions("goa").await?;
    assert_eq!(got, vec!["Goa", "Goa Shack", "Goa Villa", "India"]);
    assert!(ctx.service.get_suggestions("").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn delete_listing_cascades() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let (u2, _) = ctx.user("u2").await;
    let gone = ctx.listing(u1, "Gone").await;
    let kept = ctx.listing(u1, "Kept").await;

    let r1 = ctx.service.create_review(u2, review(gone, 4, "nice")).await?;
    let r2 = ctx.service.create_review(u2, review(kept, 5, "great")).await?;
    ctx.service.toggle_wishlist(u2, gone).await?;
    ctx.service.toggle_wishlist(u2, kept).await?;

    let err = ctx.service.delete_listing(gone, u2).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    ctx.service.delete_listing(gone, u1).await?;

    assert!(matches!(
        ctx.service.get_listing(gone).await.unwrap_err(),
        DomainError::ListingNotFound { .. }
    ));
    assert!(matches!(
        ctx.service.get_review(r1.id).await.unwrap_err(),
        DomainError::ReviewNotFound { .. }
    ));
    assert_eq!(ctx.refs(RefSet::UserListings, u1).await, vec![kept]);
    assert_eq!(ctx.refs(RefSet::UserReviews, u2).await, vec![r2.id]);
    assert_eq!(ctx.refs(RefSet::UserWishlist, u2).await, vec![kept]);
    assert!(ctx.service.list_reviews(gone).await?.is_empty());

    let err = ctx.service.delete_listing(gone, u1).await.unwrap_err();
    assert!(matches!(err, DomainError::ListingNotFound { .. }));
    Ok(())
}

// ---------------------------------------------------------------------------
// Wishlist
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wishlist_toggle_twice_restores_state() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let a = ctx.listing(u1, "A").await;
    let b = ctx.listing(u1, "B").await;

    ctx.service.toggle_wishlist(u1, a).await?;
    let before = ctx.service.get_wishlist(u1).await?;
    assert_eq!(before, vec![a]);

    let added = ctx.service.toggle_wishlist(u1, b).await?;
    assert_eq!(added.change, WishlistChange::Added);
    assert_eq!(added.wishlist, vec![a, b]);

    let removed = ctx.service.toggle_wishlist(u1, b).await?;
    assert_eq!(removed.change, WishlistChange::Removed);
    assert_eq!(removed.wishlist, before);

    let listings = ctx.service.get_wishlist_listings(u1).await?;
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].id, a);
    Ok(())
}

#[tokio::test]
async fn wishlist_add_of_missing_listing_is_not_found() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let err = ctx
        .service
        .toggle_wishlist(u1, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ListingNotFound { .. }));
    assert!(ctx.service.get_wishlist(u1).await?.is_empty());
    Ok(())
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rating_bounds_on_create() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let l1 = ctx.listing(u1, "L1").await;

    for rating in [0, 6] {
        let err = ctx
            .service
            .create_review(u1, review(l1, rating, "meh"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::RatingOutOfRange { .. }));
    }
    for rating in [1, 5] {
        ctx.service.create_review(u1, review(l1, rating, "ok")).await?;
    }
    assert_eq!(ctx.service.list_reviews(l1).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn create_review_requires_comment_and_listing() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let l1 = ctx.listing(u1, "L1").await;

    let err = ctx
        .service
        .create_review(u1, review(l1, 3, "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let err = ctx
        .service
        .create_review(u1, review(Uuid::new_v4(), 3, "ok"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ListingNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn review_shows_up_with_its_author() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let (u2, _) = ctx.user("u2").await;
    let l1 = ctx.listing(u1, "L1").await;

    let created = ctx.service.create_review(u2, review(l1, 4, "nice")).await?;

    let reviews = ctx.service.list_reviews(l1).await?;
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].review.rating, 4);
    assert_eq!(reviews[0].review.id, created.id);
    let author = reviews[0].author.as_ref().expect("author");
    assert_eq!(author.id, u2);
    assert_eq!(author.username.as_deref(), Some("u2"));

    assert_eq!(ctx.service.get_listing(l1).await?.reviews, vec![created.id]);
    assert_eq!(ctx.refs(RefSet::UserReviews, u2).await, vec![created.id]);
    Ok(())
}

#[tokio::test]
async fn delete_review_pulls_it_from_both_sets() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let (u2, _) = ctx.user("u2").await;
    let l1 = ctx.listing(u1, "L1").await;
    let l2 = ctx.listing(u1, "L2").await;

    let r1 = ctx.service.create_review(u2, review(l1, 4, "one")).await?;
    let r2 = ctx.service.create_review(u2, review(l1, 3, "two")).await?;
    let r3 = ctx.service.create_review(u1, review(l2, 5, "three")).await?;

    let err = ctx.service.delete_review(r1.id, u1).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    ctx.service.delete_review(r1.id, u2).await?;

    assert_eq!(ctx.service.get_listing(l1).await?.reviews, vec![r2.id]);
    assert_eq!(ctx.service.get_listing(l2).await?.reviews, vec![r3.id]);
    assert_eq!(ctx.refs(RefSet::UserReviews, u2).await, vec![r2.id]);
    assert_eq!(ctx.refs(RefSet::UserReviews, u1).await, vec![r3.id]);

    let err = ctx.service.delete_review(r1.id, u2).await.unwrap_err();
    assert!(matches!(err, DomainError::ReviewNotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn update_review_is_author_only_and_revalidated() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let (u2, _) = ctx.user("u2").await;
    let l1 = ctx.listing(u1, "L1").await;
    let r = ctx.service.create_review(u2, review(l1, 4, "nice")).await?;

    let err = ctx
        .service
        .update_review(
            r.id,
            u1,
            ReviewPatch {
                rating: Some(1),
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    let err = ctx
        .service
        .update_review(
            r.id,
            u2,
            ReviewPatch {
                rating: Some(9),
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::RatingOutOfRange { .. }));

    let updated = ctx
        .service
        .update_review(
            r.id,
            u2,
            ReviewPatch {
                rating: None,
                comment: Some("even nicer".into()),
            },
        )
        .await?;
    assert_eq!(updated.rating, 4);
    assert_eq!(updated.comment, "even nicer");
    assert!(updated.updated_at >= r.updated_at);
    assert_eq!(ctx.service.get_review(r.id).await?.comment, "even nicer");
    Ok(())
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[tokio::test]
async fn profile_resolves_reference_sets() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;
    let (u2, _) = ctx.user("u2").await;
    let mine = ctx.listing(u1, "Mine").await;
    let theirs = ctx.listing(u2, "Theirs").await;
    let r = ctx.service.create_review(u1, review(theirs, 5, "top")).await?;
    ctx.service.toggle_wishlist(u1, theirs).await?;

    let profile = ctx.service.get_profile(u1).await?;
    assert_eq!(profile.user.id, u1);
    assert_eq!(
        profile.listings.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![mine]
    );
    assert_eq!(profile.reviews, vec![r.id]);
    assert_eq!(
        profile.wishlist.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![theirs]
    );
    Ok(())
}

#[tokio::test]
async fn profile_update_ignores_blank_fields() -> Result<()> {
    let ctx = TestCtx::new().await;
    let (u1, _) = ctx.user("u1").await;

    ctx.service
        .update_profile(
            u1,
            ProfilePatch {
                gmail: Some("u1@gmail.com".into()),
                phone_no: Some("555-0101".into()),
                address: None,
            },
        )
        .await?;
    let profile = ctx
        .service
        .update_profile(
            u1,
            ProfilePatch {
                gmail: Some("".into()),
                phone_no: None,
                address: Some("1 Main St".into()),
            },
        )
        .await?;
    assert_eq!(profile.user.gmail.as_deref(), Some("u1@gmail.com"));
    assert_eq!(profile.user.phone_no.as_deref(), Some("555-0101"));
    assert_eq!(profile.user.address.as_deref(), Some("1 Main St"));
    Ok(())
}
