use scrobblecli::types::TrackRef;
use scrobblecli::utils::*;

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier);

    // Deterministic
    assert_eq!(challenge, generate_code_challenge(verifier));
    assert_ne!(challenge, generate_code_challenge("different_verifier"));

    // SHA-256 in URL-safe base64 without padding is 43 characters
    assert_eq!(challenge.len(), 43);
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    );
}

#[test]
fn test_generate_code_challenge_rfc7636_vector() {
    assert_eq!(
        generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn test_parse_track_ref() {
    assert_eq!(
        parse_track_ref("Daft Punk - One More Time").unwrap(),
        TrackRef::new("Daft Punk", "One More Time")
    );

    // Whitespace around both halves is trimmed
    assert_eq!(
        parse_track_ref("  Daft Punk   -   One More Time  ").unwrap(),
        TrackRef::new("Daft Punk", "One More Time")
    );
}

#[test]
fn test_parse_track_ref_splits_on_first_separator() {
    assert_eq!(
        parse_track_ref("Beck - Loser - Live").unwrap(),
        TrackRef::new("Beck", "Loser - Live")
    );

    // Hyphens without surrounding spaces belong to the name
    assert_eq!(
        parse_track_ref("Jay-Z - 99 Problems").unwrap(),
        TrackRef::new("Jay-Z", "99 Problems")
    );
}

#[test]
fn test_parse_track_ref_rejects_bad_format() {
    assert!(parse_track_ref("Daft Punk").is_err());
    assert!(parse_track_ref("Daft Punk-One More Time").is_err());
    assert!(parse_track_ref("").is_err());
    assert!(parse_track_ref(" - One More Time").is_err());
    assert!(parse_track_ref("Daft Punk - ").is_err());
}

#[test]
fn test_playlist_id() {
    let id = "37i9dQZF1DXcBWIGoYBM5M";

    assert_eq!(playlist_id(id).unwrap(), id);
    assert_eq!(
        playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M").unwrap(),
        id
    );
    assert_eq!(
        playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=4f2a9c").unwrap(),
        id
    );
    assert_eq!(
        playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M/").unwrap(),
        id
    );
    assert_eq!(playlist_id("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M").unwrap(), id);
}

#[test]
fn test_playlist_id_rejects_garbage() {
    assert!(playlist_id("").is_err());
    assert!(playlist_id("https://open.spotify.com/playlist/").is_err());
    assert!(playlist_id("spotify:playlist:").is_err());
    assert!(playlist_id("not a playlist").is_err());
}

#[test]
fn test_now_unix_is_current() {
    let now = now_unix();
    // 2023-11-14 and later
    assert!(now > 1_700_000_000);
}
