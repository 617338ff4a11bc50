/// SQL schema for the Daybook database
/// Creates all tables with proper constraints, foreign keys, and indexes
pub const SCHEMA: &str = r#"
-- Users table (username stays NULL until claimed)
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    username TEXT,
    join_date TEXT NOT NULL
);

-- Usernames are unique regardless of case; NULLs do not collide
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users(username COLLATE NOCASE);

-- Posts table
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    content TEXT NOT NULL CHECK(length(content) <= 280),
    created_at TEXT NOT NULL,
    start_time TEXT,
    end_time TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts(author_id);

-- Likes table (row existence means liked)
CREATE TABLE IF NOT EXISTS likes (
    post_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (post_id, user_id),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_likes_user_id ON likes(user_id);

-- Follow edges with request status
CREATE TABLE IF NOT EXISTS follows (
    id TEXT PRIMARY KEY,
    follower_id TEXT NOT NULL,
    followee_id TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('pending', 'accepted', 'rejected')),
    created_at TEXT NOT NULL,
    UNIQUE (follower_id, followee_id),
    FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (followee_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows(follower_id);
CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id);

-- Schedule entries, private to their owner
CREATE TABLE IF NOT EXISTS schedule_entries (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    text TEXT NOT NULL,
    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_schedule_owner_date ON schedule_entries(owner_id, date);

-- Sessions table for bearer tokens
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

/// Demo data for local development
pub const DEMO_DATA: &str = r#"
-- ============================================================================
-- USERS
-- ============================================================================
INSERT OR IGNORE INTO users (id, email, username, join_date) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', 'ada@daybook.dev', 'ada', '2026-01-01T08:00:00Z'),
    ('550e8400-e29b-41d4-a716-446655440002', 'grace@daybook.dev', 'grace', '2026-01-02T09:00:00Z'),
    ('550e8400-e29b-41d4-a716-446655440003', 'linus@daybook.dev', 'linus', '2026-01-03T10:00:00Z'),
    ('550e8400-e29b-41d4-a716-446655440004', 'newcomer@daybook.dev', NULL, '2026-01-04T11:00:00Z');

-- ============================================================================
-- POSTS
-- ============================================================================
INSERT OR IGNORE INTO posts (id, author_id, content, created_at, start_time, end_time, completed) VALUES
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'Deep work on the analytical engine notes', '2026-01-10T07:00:00Z', '08:00:00', '11:00:00', 1),
    ('650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440001', 'Long walk, no phone', '2026-01-10T12:00:00Z', '12:30:00', '13:15:00', 0),
    ('650e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440002', 'Compiler reading group', '2026-01-10T08:30:00Z', '15:00:00', '16:00:00', 0),
    ('650e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440002', 'Debugging session, bring snacks', '2026-01-09T16:00:00Z', NULL, NULL, 1),
    ('650e8400-e29b-41d4-a716-446655440005', '550e8400-e29b-41d4-a716-446655440003', 'Reviewing patches all afternoon', '2026-01-10T11:00:00Z', '13:00:00', '18:00:00', 0);

-- ============================================================================
-- LIKES
-- ============================================================================
INSERT OR IGNORE INTO likes (post_id, user_id, created_at) VALUES
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', '2026-01-10T09:00:00Z'),
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', '2026-01-10T09:30:00Z'),
    ('650e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', '2026-01-10T10:00:00Z'),
    ('650e8400-e29b-41d4-a716-446655440005', '550e8400-e29b-41d4-a716-446655440002', '2026-01-10T11:30:00Z');

-- ============================================================================
-- FOLLOWS
-- ============================================================================
INSERT OR IGNORE INTO follows (id, follower_id, followee_id, status, created_at) VALUES
    -- Ada and Grace are friends both ways
    ('750e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', 'accepted', '2026-01-05T08:00:00Z'),
    ('750e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440001', 'accepted', '2026-01-05T08:05:00Z'),
    -- Linus is waiting on Ada
    ('750e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', 'pending', '2026-01-06T09:00:00Z');
"#;
