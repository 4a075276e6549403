use super::models::*;
use super::store::*;
use super::video_models::*;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use crate::user::{
    Account, AccountStore, PasswordCredentials, PasswordHasherKind, SessionToken,
    SessionTokenValue, UserRole,
};
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "track",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const ACCOUNT_FK: ForeignKey = ForeignKey {
    foreign_table: "account",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "user_playlist",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const VIDEO_FK: ForeignKey = ForeignKey {
    foreign_table: "video",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// V 0
const TRACK_TABLE_V_0: Table = Table {
    name: "track",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("album", &SqlType::Text),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!(
            "duration",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("cover_image", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_track_created_at", "created_at")],
    unique_constraints: &[],
};

const TRACK_GENRE_TABLE_V_0: Table = Table {
    name: "track_genre",
    columns: &[
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_track_genre_genre", "genre")],
    unique_constraints: &[&["track_id", "genre"]],
};

const USER_FAVORITE_TABLE_V_0: Table = Table {
    name: "user_favorite",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!(
            "added_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["user_id", "track_id"]],
};

const LISTENING_HISTORY_TABLE_V_0: Table = Table {
    name: "listening_history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!(
            "played_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "play_duration",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "completed",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[
        ("idx_listening_history_user", "user_id"),
        ("idx_listening_history_track", "track_id"),
    ],
    unique_constraints: &[],
};

const USER_INTERACTION_TABLE_V_0: Table = Table {
    name: "user_interaction",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!("interaction_type", &SqlType::Text, non_null = true),
        sqlite_column!(
            "interaction_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!(
            "total_play_time",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "last_interaction",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["user_id", "track_id", "interaction_type"]],
};

const ACCOUNT_TABLE_V_0: Table = Table {
    name: "account",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("username", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "role",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'user'")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ACCOUNT_PASSWORD_TABLE_V_0: Table = Table {
    name: "account_password",
    columns: &[
        sqlite_column!(
            "account_id",
            &SqlType::Integer,
            is_primary_key = true,
            non_null = true,
            foreign_key = Some(&ACCOUNT_FK)
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const SESSION_TOKEN_TABLE_V_0: Table = Table {
    name: "session_token",
    columns: &[
        sqlite_column!(
            "account_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ACCOUNT_FK)
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

/// V 1
const USER_PLAYLIST_TABLE_V_1: Table = Table {
    name: "user_playlist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!(
            "is_public",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_user_playlist_user", "user_id")],
    unique_constraints: &[],
};

const USER_PLAYLIST_TRACK_TABLE_V_1: Table = Table {
    name: "user_playlist_track",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "added_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_user_playlist_track_playlist", "playlist_id")],
    unique_constraints: &[],
};

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    USER_PLAYLIST_TABLE_V_1.create(conn)?;
    USER_PLAYLIST_TRACK_TABLE_V_1.create(conn)?;
    Ok(())
}

/// V 2
const VIDEO_TABLE_V_2: Table = Table {
    name: "video",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("url", &SqlType::Text, non_null = true),
        sqlite_column!("thumbnail", &SqlType::Text),
        sqlite_column!(
            "duration",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("category", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_video_created_at", "created_at")],
    unique_constraints: &[],
};

const VIDEO_FAVORITE_TABLE_V_2: Table = Table {
    name: "video_favorite",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "video_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&VIDEO_FK)
        ),
        sqlite_column!(
            "added_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["user_id", "video_id"]],
};

const VIDEO_HISTORY_TABLE_V_2: Table = Table {
    name: "video_history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "video_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&VIDEO_FK)
        ),
        sqlite_column!(
            "watched_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "watch_duration",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "completed",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_video_history_user", "user_id")],
    unique_constraints: &[],
};

const CURATED_PLAYLIST_TABLE_V_2: Table = Table {
    name: "curated_playlist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    VIDEO_TABLE_V_2.create(conn)?;
    VIDEO_FAVORITE_TABLE_V_2.create(conn)?;
    VIDEO_HISTORY_TABLE_V_2.create(conn)?;
    CURATED_PLAYLIST_TABLE_V_2.create(conn)?;
    Ok(())
}

pub(crate) const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            TRACK_TABLE_V_0,
            TRACK_GENRE_TABLE_V_0,
            USER_FAVORITE_TABLE_V_0,
            LISTENING_HISTORY_TABLE_V_0,
            USER_INTERACTION_TABLE_V_0,
            ACCOUNT_TABLE_V_0,
            ACCOUNT_PASSWORD_TABLE_V_0,
            SESSION_TOKEN_TABLE_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            TRACK_TABLE_V_0,
            TRACK_GENRE_TABLE_V_0,
            USER_FAVORITE_TABLE_V_0,
            LISTENING_HISTORY_TABLE_V_0,
            USER_INTERACTION_TABLE_V_0,
            ACCOUNT_TABLE_V_0,
            ACCOUNT_PASSWORD_TABLE_V_0,
            SESSION_TOKEN_TABLE_V_0,
            USER_PLAYLIST_TABLE_V_1,
            USER_PLAYLIST_TRACK_TABLE_V_1,
        ],
        migration: Some(migrate_v0_to_v1),
    },
    VersionedSchema {
        version: 2,
        tables: &[
            TRACK_TABLE_V_0,
            TRACK_GENRE_TABLE_V_0,
            USER_FAVORITE_TABLE_V_0,
            LISTENING_HISTORY_TABLE_V_0,
            USER_INTERACTION_TABLE_V_0,
            ACCOUNT_TABLE_V_0,
            ACCOUNT_PASSWORD_TABLE_V_0,
            SESSION_TOKEN_TABLE_V_0,
            USER_PLAYLIST_TABLE_V_1,
            USER_PLAYLIST_TRACK_TABLE_V_1,
            VIDEO_TABLE_V_2,
            VIDEO_FAVORITE_TABLE_V_2,
            VIDEO_HISTORY_TABLE_V_2,
            CURATED_PLAYLIST_TABLE_V_2,
        ],
        migration: Some(migrate_v1_to_v2),
    },
];

const TRACK_COLUMNS: &str =
    "t.id, t.title, t.artist, t.album, t.url, t.duration, t.cover_image, t.created_at";

/// Reads the first eight columns of `row` as laid out by `TRACK_COLUMNS`.
/// Genres are attached separately.
fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        album: row.get(3)?,
        url: row.get(4)?,
        duration: row.get(5)?,
        cover_image: row.get(6)?,
        created_at: row.get(7)?,
        genres: Vec::new(),
    })
}

fn genres_by_track(conn: &Connection) -> Result<HashMap<TrackId, Vec<String>>> {
    let mut stmt = conn.prepare("SELECT track_id, genre FROM track_genre ORDER BY genre")?;
    let mut genres: HashMap<TrackId, Vec<String>> = HashMap::new();
    let rows = stmt.query_map([], |row| Ok((row.get::<_, TrackId>(0)?, row.get(1)?)))?;
    for row in rows {
        let (track_id, genre) = row?;
        genres.entry(track_id).or_default().push(genre);
    }
    Ok(genres)
}

fn attach_genres<'a, I>(conn: &Connection, tracks: I) -> Result<()>
where
    I: IntoIterator<Item = &'a mut Track>,
{
    let mut genres = genres_by_track(conn)?;
    for track in tracks {
        track.genres = genres.remove(&track.id).unwrap_or_default();
    }
    Ok(())
}

fn track_exists(conn: &Connection, track_id: TrackId) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM track WHERE id = ?1", params![track_id], |_| {
            Ok(())
        })
        .optional()?
        .is_some())
}

const VIDEO_COLUMNS: &str =
    "v.id, v.title, v.description, v.url, v.thumbnail, v.duration, v.category, v.created_at";

/// Reads the first eight columns of `row` as laid out by `VIDEO_COLUMNS`.
fn video_from_row(row: &Row) -> rusqlite::Result<Video> {
    Ok(Video {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        url: row.get(3)?,
        thumbnail: row.get(4)?,
        duration: row.get(5)?,
        category: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn video_exists(conn: &Connection, video_id: VideoId) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM video WHERE id = ?1", params![video_id], |_| {
            Ok(())
        })
        .optional()?
        .is_some())
}

fn upsert_interaction(
    conn: &Connection,
    user_id: &str,
    track_id: TrackId,
    interaction_type: &str,
    play_duration: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO user_interaction
            (user_id, track_id, interaction_type, interaction_count, total_play_time, last_interaction)
         VALUES (?1, ?2, ?3, 1, ?4, cast(strftime('%s','now') as int))
         ON CONFLICT(user_id, track_id, interaction_type) DO UPDATE SET
            interaction_count = interaction_count + 1,
            total_play_time = total_play_time + excluded.total_play_time,
            last_interaction = excluded.last_interaction",
        params![user_id, track_id, interaction_type, play_duration],
    )
    .with_context(|| {
        format!(
            "Failed to record {} interaction of {} on track {}",
            interaction_type, user_id, track_id
        )
    })?;
    Ok(())
}

fn append_history(
    conn: &Connection,
    user_id: &str,
    track_id: TrackId,
    play_duration: i64,
    completed: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO listening_history (user_id, track_id, play_duration, completed)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, track_id, play_duration, completed],
    )
    .with_context(|| format!("Failed to append history of {} on track {}", user_id, track_id))?;
    Ok(())
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn system_time_to_secs(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn account_from_parts(id: i64, username: String, role: String) -> Result<Account> {
    Ok(Account {
        id: id as usize,
        username,
        role: role.parse()?,
    })
}

#[derive(Clone)]
pub struct SqliteMediaStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMediaStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteMediaStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl CatalogStore for SqliteMediaStore {
    fn list_tracks(&self) -> Result<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM track t ORDER BY t.created_at DESC, t.id DESC",
            TRACK_COLUMNS
        ))?;
        let mut tracks = stmt
            .query_map([], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        attach_genres(&conn, tracks.iter_mut())?;
        Ok(tracks)
    }

    fn add_track(&self, track: &NewTrack) -> Result<TrackId> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO track (title, artist, album, url, duration, cover_image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                track.title.trim(),
                track.artist.trim(),
                track.album,
                track.url.trim(),
                track.duration.unwrap_or(0).max(0),
                track.cover_image
            ],
        )
        .with_context(|| format!("Failed to insert track {}", track.title))?;
        let track_id = tx.last_insert_rowid();
        for genre in track.normalized_genres() {
            tx.execute(
                "INSERT INTO track_genre (track_id, genre) VALUES (?1, ?2)",
                params![track_id, genre],
            )?;
        }
        tx.commit()?;
        debug!("Added track {} ({})", track_id, track.title);
        Ok(track_id)
    }

    fn delete_track(&self, track_id: TrackId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM track WHERE id = ?1", params![track_id])?;
        Ok(deleted > 0)
    }

    fn list_genres(&self) -> Result<Vec<GenreSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT genre, COUNT(*) AS track_count FROM track_genre
             GROUP BY genre ORDER BY track_count DESC, genre ASC",
        )?;
        let genres = stmt
            .query_map([], |row| {
                Ok(GenreSummary {
                    genre: row.get(0)?,
                    track_count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    fn search_tracks(&self, user_id: &str, filter: &SearchFilter) -> Result<Vec<SearchHit>> {
        let mut sql = format!(
            "SELECT {}, EXISTS(SELECT 1 FROM user_favorite f
                               WHERE f.track_id = t.id AND f.user_id = ?1)
             FROM track t WHERE 1=1",
            TRACK_COLUMNS
        );
        let mut args: Vec<String> = vec![user_id.to_owned()];

        if let Some(q) = non_blank(&filter.q) {
            let n = args.len();
            sql.push_str(&format!(
                " AND (t.title LIKE ?{a} ESCAPE '\\' OR t.artist LIKE ?{a} ESCAPE '\\' \
                 OR t.album LIKE ?{a} ESCAPE '\\')",
                a = n + 1
            ));
            args.push(escape_like(q));
        }
        if let Some(genre) = non_blank(&filter.genre) {
            sql.push_str(&format!(
                " AND EXISTS(SELECT 1 FROM track_genre g WHERE g.track_id = t.id \
                 AND g.genre LIKE ?{} ESCAPE '\\')",
                args.len() + 1
            ));
            args.push(escape_like(genre));
        }
        if let Some(artist) = non_blank(&filter.artist) {
            sql.push_str(&format!(
                " AND t.artist LIKE ?{} ESCAPE '\\'",
                args.len() + 1
            ));
            args.push(escape_like(artist));
        }
        sql.push_str(" ORDER BY t.title, t.id");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let mut hits = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(SearchHit {
                    track: track_from_row(row)?,
                    is_favorited: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        attach_genres(&conn, hits.iter_mut().map(|h| &mut h.track))?;
        Ok(hits)
    }

    fn count_tracks(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM track", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl DiscoveryStore for SqliteMediaStore {
    fn catalog_snapshot(&self) -> Result<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM track t", TRACK_COLUMNS))?;
        let mut tracks = stmt
            .query_map([], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        attach_genres(&conn, tracks.iter_mut())?;
        Ok(tracks)
    }

    fn aggregate_play_counts(&self) -> Result<HashMap<TrackId, u64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT track_id, COUNT(*) FROM listening_history GROUP BY track_id")?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, TrackId>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(counts)
    }

    fn favorite_track_ids(&self, user_id: &str) -> Result<HashSet<TrackId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT track_id FROM user_favorite WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<Result<HashSet<TrackId>, _>>()?;
        Ok(ids)
    }
}

impl AffinityStore for SqliteMediaStore {
    fn toggle_favorite(&self, user_id: &str, track_id: TrackId) -> Result<Option<bool>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if !track_exists(&tx, track_id)? {
            return Ok(None);
        }
        let removed = tx.execute(
            "DELETE FROM user_favorite WHERE user_id = ?1 AND track_id = ?2",
            params![user_id, track_id],
        )?;
        if removed == 0 {
            tx.execute(
                "INSERT INTO user_favorite (user_id, track_id) VALUES (?1, ?2)",
                params![user_id, track_id],
            )?;
        }
        tx.commit()?;
        Ok(Some(removed == 0))
    }

    fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteTrack>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, f.added_at FROM track t
             JOIN user_favorite f ON f.track_id = t.id
             WHERE f.user_id = ?1
             ORDER BY f.added_at DESC, f.id DESC",
            TRACK_COLUMNS
        ))?;
        let mut favorites = stmt
            .query_map(params![user_id], |row| {
                Ok(FavoriteTrack {
                    track: track_from_row(row)?,
                    favorited_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        attach_genres(&conn, favorites.iter_mut().map(|f| &mut f.track))?;
        Ok(favorites)
    }
}

impl EngagementStore for SqliteMediaStore {
    fn record_interaction(
        &self,
        user_id: &str,
        track_id: TrackId,
        interaction_type: &str,
        play_duration: i64,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        if !track_exists(&conn, track_id)? {
            return Ok(false);
        }
        upsert_interaction(&conn, user_id, track_id, interaction_type, play_duration)?;
        Ok(true)
    }

    fn record_history(
        &self,
        user_id: &str,
        track_id: TrackId,
        play_duration: i64,
        completed: bool,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        if !track_exists(&conn, track_id)? {
            return Ok(false);
        }
        append_history(&conn, user_id, track_id, play_duration, completed)?;
        Ok(true)
    }

    fn log_interaction(
        &self,
        user_id: &str,
        track_id: TrackId,
        interaction_type: &str,
        play_duration: i64,
    ) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if !track_exists(&tx, track_id)? {
            return Ok(false);
        }
        upsert_interaction(&tx, user_id, track_id, interaction_type, play_duration)?;
        if interaction_type == PLAY_INTERACTION {
            append_history(
                &tx,
                user_id,
                track_id,
                play_duration,
                is_completed_play(play_duration),
            )?;
        }
        tx.commit()?;
        Ok(true)
    }

    fn get_interaction(
        &self,
        user_id: &str,
        track_id: TrackId,
        interaction_type: &str,
    ) -> Result<Option<Interaction>> {
        let conn = self.conn.lock().unwrap();
        let interaction = conn
            .query_row(
                "SELECT user_id, track_id, interaction_type, interaction_count,
                        total_play_time, last_interaction
                 FROM user_interaction
                 WHERE user_id = ?1 AND track_id = ?2 AND interaction_type = ?3",
                params![user_id, track_id, interaction_type],
                |row| {
                    Ok(Interaction {
                        user_id: row.get(0)?,
                        track_id: row.get(1)?,
                        interaction_type: row.get(2)?,
                        interaction_count: row.get::<_, i64>(3)? as u64,
                        total_play_time: row.get(4)?,
                        last_interaction: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(interaction)
    }

    fn recent_tracks(&self, user_id: &str, limit: usize) -> Result<Vec<RecentTrack>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {},
                    MAX(h.played_at) AS last_played_at,
                    (SELECT h2.play_duration FROM listening_history h2
                     WHERE h2.user_id = ?1 AND h2.track_id = t.id
                     ORDER BY h2.played_at DESC, h2.id DESC LIMIT 1),
                    COUNT(h.id)
             FROM track t
             JOIN listening_history h ON h.track_id = t.id
             WHERE h.user_id = ?1
             GROUP BY t.id
             ORDER BY last_played_at DESC, MAX(h.id) DESC
             LIMIT ?2",
            TRACK_COLUMNS
        ))?;
        let mut recent = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(RecentTrack {
                    track: track_from_row(row)?,
                    last_played_at: row.get(8)?,
                    play_duration: row.get(9)?,
                    play_count: row.get::<_, i64>(10)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        attach_genres(&conn, recent.iter_mut().map(|r| &mut r.track))?;
        Ok(recent)
    }

    fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let conn = self.conn.lock().unwrap();
        let (total_listening_time, total_plays): (i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(play_duration), 0), COUNT(*)
             FROM listening_history WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let favorite_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM user_favorite WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let mut stmt = conn.prepare(
            "SELECT g.genre, COUNT(*) AS count
             FROM listening_history h
             JOIN track_genre g ON g.track_id = h.track_id
             WHERE h.user_id = ?1
             GROUP BY g.genre
             ORDER BY count DESC, g.genre ASC
             LIMIT 5",
        )?;
        let top_genres = stmt
            .query_map(params![user_id], |row| {
                Ok(GenreCount {
                    genre: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserStats {
            total_listening_time,
            total_plays: total_plays as u64,
            favorite_count: favorite_count as u64,
            top_genres,
        })
    }
}

impl PlaylistStore for SqliteMediaStore {
    fn list_user_playlists(&self, user_id: &str) -> Result<Vec<UserPlaylist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.user_id, p.name, p.description, p.is_public, p.created_at,
                    COUNT(pt.id)
             FROM user_playlist p
             LEFT JOIN user_playlist_track pt ON pt.playlist_id = p.id
             WHERE p.user_id = ?1 OR p.is_public = 1
             GROUP BY p.id
             ORDER BY p.created_at DESC, p.id DESC",
        )?;
        let playlists = stmt
            .query_map(params![user_id], |row| {
                Ok(UserPlaylist {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    is_public: row.get(4)?,
                    created_at: row.get(5)?,
                    track_count: row.get::<_, i64>(6)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(playlists)
    }

    fn create_user_playlist(&self, user_id: &str, playlist: &NewPlaylist) -> Result<PlaylistId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_playlist (user_id, name, description, is_public)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                playlist.name.trim(),
                playlist.description,
                playlist.is_public
            ],
        )
        .with_context(|| format!("Failed to create playlist {}", playlist.name))?;
        Ok(conn.last_insert_rowid())
    }

    fn add_track_to_user_playlist(
        &self,
        user_id: &str,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> Result<PlaylistEdit> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let owned = tx
            .query_row(
                "SELECT 1 FROM user_playlist WHERE id = ?1 AND user_id = ?2",
                params![playlist_id, user_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !owned {
            return Ok(PlaylistEdit::AccessDenied);
        }
        if !track_exists(&tx, track_id)? {
            return Ok(PlaylistEdit::TrackNotFound);
        }
        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM user_playlist_track WHERE playlist_id = ?1",
            params![playlist_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO user_playlist_track (playlist_id, track_id, position) VALUES (?1, ?2, ?3)",
            params![playlist_id, track_id, position],
        )?;
        tx.commit()?;
        Ok(PlaylistEdit::Done)
    }

    fn get_user_playlist_tracks(&self, playlist_id: PlaylistId) -> Result<Vec<PlaylistTrack>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, pt.position, pt.added_at FROM track t
             JOIN user_playlist_track pt ON pt.track_id = t.id
             WHERE pt.playlist_id = ?1
             ORDER BY pt.position",
            TRACK_COLUMNS
        ))?;
        let mut tracks = stmt
            .query_map(params![playlist_id], |row| {
                Ok(PlaylistTrack {
                    track: track_from_row(row)?,
                    position: row.get(8)?,
                    added_at: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        attach_genres(&conn, tracks.iter_mut().map(|t| &mut t.track))?;
        Ok(tracks)
    }

    fn delete_user_playlist(&self, user_id: &str, playlist_id: PlaylistId) -> Result<PlaylistEdit> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM user_playlist WHERE id = ?1 AND user_id = ?2",
            params![playlist_id, user_id],
        )?;
        Ok(if deleted > 0 {
            PlaylistEdit::Done
        } else {
            PlaylistEdit::AccessDenied
        })
    }

    fn list_curated_playlists(&self) -> Result<Vec<CuratedPlaylist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at FROM curated_playlist
             ORDER BY created_at DESC, id DESC",
        )?;
        let playlists = stmt
            .query_map([], |row| {
                Ok(CuratedPlaylist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(playlists)
    }

    fn create_curated_playlist(&self, playlist: &NewCuratedPlaylist) -> Result<PlaylistId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO curated_playlist (name, description) VALUES (?1, ?2)",
            params![playlist.name.trim(), playlist.description],
        )
        .with_context(|| format!("Failed to create curated playlist {}", playlist.name))?;
        Ok(conn.last_insert_rowid())
    }
}

impl VideoStore for SqliteMediaStore {
    fn list_videos(&self, user_id: &str) -> Result<Vec<VideoHit>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, EXISTS(SELECT 1 FROM video_favorite f
                               WHERE f.video_id = v.id AND f.user_id = ?1)
             FROM video v ORDER BY v.created_at DESC, v.id DESC",
            VIDEO_COLUMNS
        ))?;
        let videos = stmt
            .query_map(params![user_id], |row| {
                Ok(VideoHit {
                    video: video_from_row(row)?,
                    is_favorited: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    fn add_video(&self, video: &NewVideo) -> Result<VideoId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO video (title, description, url, thumbnail, duration, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                video.title.trim(),
                video.description,
                video.url.trim(),
                video.thumbnail,
                video.duration.unwrap_or(0).max(0),
                non_blank(&video.category)
            ],
        )
        .with_context(|| format!("Failed to insert video {}", video.title))?;
        let video_id = conn.last_insert_rowid();
        debug!("Added video {} ({})", video_id, video.title);
        Ok(video_id)
    }

    fn delete_video(&self, video_id: VideoId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM video WHERE id = ?1", params![video_id])?;
        Ok(deleted > 0)
    }

    fn count_videos(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM video", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn toggle_video_favorite(&self, user_id: &str, video_id: VideoId) -> Result<Option<bool>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if !video_exists(&tx, video_id)? {
            return Ok(None);
        }
        let removed = tx.execute(
            "DELETE FROM video_favorite WHERE user_id = ?1 AND video_id = ?2",
            params![user_id, video_id],
        )?;
        if removed == 0 {
            tx.execute(
                "INSERT INTO video_favorite (user_id, video_id) VALUES (?1, ?2)",
                params![user_id, video_id],
            )?;
        }
        tx.commit()?;
        Ok(Some(removed == 0))
    }

    fn list_video_favorites(&self, user_id: &str) -> Result<Vec<FavoriteVideo>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, f.added_at FROM video v
             JOIN video_favorite f ON f.video_id = v.id
             WHERE f.user_id = ?1
             ORDER BY f.added_at DESC, f.id DESC",
            VIDEO_COLUMNS
        ))?;
        let favorites = stmt
            .query_map(params![user_id], |row| {
                Ok(FavoriteVideo {
                    video: video_from_row(row)?,
                    favorited_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(favorites)
    }

    fn record_watch(
        &self,
        user_id: &str,
        video_id: VideoId,
        watch_duration: i64,
        completed: bool,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        if !video_exists(&conn, video_id)? {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO video_history (user_id, video_id, watch_duration, completed)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, video_id, watch_duration, completed],
        )
        .with_context(|| format!("Failed to record watch of {} on video {}", user_id, video_id))?;
        Ok(true)
    }

    fn recent_videos(&self, user_id: &str, limit: usize) -> Result<Vec<RecentVideo>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {},
                    MAX(h.watched_at) AS last_watched_at,
                    (SELECT h2.watch_duration FROM video_history h2
                     WHERE h2.user_id = ?1 AND h2.video_id = v.id
                     ORDER BY h2.watched_at DESC, h2.id DESC LIMIT 1),
                    COUNT(h.id),
                    EXISTS(SELECT 1 FROM video_favorite f
                           WHERE f.video_id = v.id AND f.user_id = ?1)
             FROM video v
             JOIN video_history h ON h.video_id = v.id
             WHERE h.user_id = ?1
             GROUP BY v.id
             ORDER BY last_watched_at DESC, MAX(h.id) DESC
             LIMIT ?2",
            VIDEO_COLUMNS
        ))?;
        let recent = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(RecentVideo {
                    video: video_from_row(row)?,
                    last_watched_at: row.get(8)?,
                    watch_duration: row.get(9)?,
                    watch_count: row.get::<_, i64>(10)? as u64,
                    is_favorited: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recent)
    }

    fn search_videos(&self, user_id: &str, filter: &VideoSearchFilter) -> Result<Vec<VideoHit>> {
        let mut sql = format!(
            "SELECT {}, EXISTS(SELECT 1 FROM video_favorite f
                               WHERE f.video_id = v.id AND f.user_id = ?1)
             FROM video v WHERE 1=1",
            VIDEO_COLUMNS
        );
        let mut args: Vec<String> = vec![user_id.to_owned()];

        if let Some(q) = non_blank(&filter.q) {
            sql.push_str(&format!(
                " AND (v.title LIKE ?{a} ESCAPE '\\' OR v.description LIKE ?{a} ESCAPE '\\')",
                a = args.len() + 1
            ));
            args.push(escape_like(q));
        }
        if let Some(category) = non_blank(&filter.category) {
            sql.push_str(&format!(
                " AND v.category LIKE ?{} ESCAPE '\\'",
                args.len() + 1
            ));
            args.push(escape_like(category));
        }
        sql.push_str(" ORDER BY v.title, v.id");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let hits = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok(VideoHit {
                    video: video_from_row(row)?,
                    is_favorited: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    }

    fn list_video_categories(&self) -> Result<Vec<VideoCategory>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT category, COUNT(*) AS video_count FROM video
             GROUP BY category ORDER BY video_count DESC, category ASC",
        )?;
        let categories = stmt
            .query_map([], |row| {
                Ok(VideoCategory {
                    category: row.get(0)?,
                    video_count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}

impl AccountStore for SqliteMediaStore {
    fn create_account(
        &self,
        username: &str,
        credentials: &PasswordCredentials,
        role: UserRole,
    ) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO account (username, role) VALUES (?1, ?2)",
            params![username, role.to_string()],
        )
        .with_context(|| format!("Failed to create account {}", username))?;
        let account_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO account_password (account_id, salt, hash, hasher) VALUES (?1, ?2, ?3, ?4)",
            params![
                account_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string()
            ],
        )?;
        tx.commit()?;
        Ok(account_id as usize)
    }

    fn get_account_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(Account, PasswordCredentials)>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT a.id, a.username, a.role, p.salt, p.hash, p.hasher
                 FROM account a JOIN account_password p ON p.account_id = a.id
                 WHERE a.username = ?1",
                params![username],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some((id, username, role, salt, hash, hasher)) => {
                let account = account_from_parts(id, username, role)?;
                let hasher: PasswordHasherKind = hasher.parse()?;
                Ok(Some((account, PasswordCredentials { salt, hash, hasher })))
            }
        }
    }

    fn update_account_password(
        &self,
        username: &str,
        credentials: &PasswordCredentials,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE account_password SET salt = ?1, hash = ?2, hasher = ?3
             WHERE account_id = (SELECT id FROM account WHERE username = ?4)",
            params![
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
                username
            ],
        )?;
        Ok(updated > 0)
    }

    fn delete_account(&self, username: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM account WHERE username = ?1", params![username])?;
        Ok(deleted > 0)
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, username, role FROM account ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<(i64, String, String)>, _>>()?;
        rows.into_iter()
            .map(|(id, username, role)| account_from_parts(id, username, role))
            .collect()
    }

    fn add_session_token(&self, token: &SessionToken) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO session_token (account_id, value, created, last_used)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token.account_id as i64,
                token.value.0,
                system_time_to_secs(token.created),
                token.last_used.map(system_time_to_secs)
            ],
        )
        .context("Failed to store session token")?;
        Ok(())
    }

    fn get_session_account(&self, token: &SessionTokenValue) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT a.id, a.username, a.role
                 FROM session_token s JOIN account a ON a.id = s.account_id
                 WHERE s.value = ?1",
                params![token.0],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (id, username, role): (i64, String, String) = match row {
            Some(row) => row,
            None => return Ok(None),
        };
        conn.execute(
            "UPDATE session_token SET last_used = ?1 WHERE value = ?2",
            params![system_time_to_secs(SystemTime::now()), token.0],
        )?;
        Ok(Some(account_from_parts(id, username, role)?))
    }

    fn delete_session_token(&self, token: &SessionTokenValue) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM session_token WHERE value = ?1",
            params![token.0],
        )?;
        Ok(deleted > 0)
    }
}
