//! Database seeder for Twungurane development and testing.
//!
//! Seeds a platform admin, a handful of members and a demo savings
//! group with memberships, then prints development bearer tokens for
//! the seeded users.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use twungurane_db::entities::{
    group_members, groups,
    sea_orm_active_enums::{
        DbFrequency, DbGroupStatus, DbGroupType, DbMemberRole, DbMemberStatus, UserRole,
    },
    users,
};
use twungurane_shared::{JwtConfig, JwtService};

/// Platform admin ID (consistent for all seeds)
const ADMIN_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo treasurer ID
const TREASURER_USER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Demo member ID
const MEMBER_USER_ID: &str = "00000000-0000-0000-0000-000000000003";
/// Demo group ID
const DEMO_GROUP_ID: &str = "00000000-0000-0000-0000-000000000010";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = twungurane_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    seed_users(&db).await;

    println!("Seeding demo group...");
    seed_demo_group(&db).await;

    println!("Seeding memberships...");
    seed_memberships(&db).await;

    println!("Seeding complete!");
    print_dev_tokens();
}

fn admin_user_id() -> Uuid {
    Uuid::parse_str(ADMIN_USER_ID).unwrap()
}

fn treasurer_user_id() -> Uuid {
    Uuid::parse_str(TREASURER_USER_ID).unwrap()
}

fn member_user_id() -> Uuid {
    Uuid::parse_str(MEMBER_USER_ID).unwrap()
}

fn demo_group_id() -> Uuid {
    Uuid::parse_str(DEMO_GROUP_ID).unwrap()
}

async fn seed_users(db: &DatabaseConnection) {
    let seeds = [
        (
            admin_user_id(),
            "Platform Admin",
            "+25779000001",
            UserRole::Admin,
        ),
        (
            treasurer_user_id(),
            "Chantal Niyonzima",
            "+25779000002",
            UserRole::Member,
        ),
        (
            member_user_id(),
            "Jean-Claude Ndayishimiye",
            "+25761000003",
            UserRole::Member,
        ),
    ];

    for (id, full_name, phone, role) in seeds {
        if users::Entity::find_by_id(id)
            .one(db)
            .await
            .expect("Failed to query users")
            .is_some()
        {
            println!("  User {full_name} already exists, skipping");
            continue;
        }

        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(id),
            full_name: Set(full_name.to_string()),
            phone: Set(phone.to_string()),
            email: Set(None),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        user.insert(db).await.expect("Failed to insert user");
        println!("  Created user {full_name}");
    }
}

async fn seed_demo_group(db: &DatabaseConnection) {
    if groups::Entity::find_by_id(demo_group_id())
        .one(db)
        .await
        .expect("Failed to query groups")
        .is_some()
    {
        println!("  Demo group already exists, skipping");
        return;
    }

    let now = Utc::now();
    let group = groups::ActiveModel {
        id: Set(demo_group_id()),
        name: Set("Twungurane Demo VSLA".to_string()),
        description: Set(Some("Seeded group for local development".to_string())),
        group_type: Set(DbGroupType::Vsla),
        status: Set(DbGroupStatus::Active),
        contribution_amount: Set(Decimal::from(5_000)),
        frequency: Set(DbFrequency::Weekly),
        interest_rate: Set(Decimal::from(10)),
        penalty_rate: Set(Decimal::from(5)),
        duration_months: Set(12),
        max_members: Set(20),
        balance: Set(Decimal::ZERO),
        created_by: Set(treasurer_user_id()),
        deleted_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    group.insert(db).await.expect("Failed to insert group");
    println!("  Created demo group");
}

async fn seed_memberships(db: &DatabaseConnection) {
    let seeds = [
        (treasurer_user_id(), DbMemberRole::Admin),
        (member_user_id(), DbMemberRole::Member),
    ];

    for (user_id, role) in seeds {
        let existing = group_members::Entity::find()
            .all(db)
            .await
            .expect("Failed to query memberships")
            .into_iter()
            .any(|m| m.group_id == demo_group_id() && m.user_id == user_id);
        if existing {
            println!("  Membership for {user_id} already exists, skipping");
            continue;
        }

        let now = Utc::now();
        let membership = group_members::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(demo_group_id()),
            user_id: Set(user_id),
            role: Set(role),
            status: Set(DbMemberStatus::Active),
            total_savings: Set(Decimal::ZERO),
            joined_at: Set(now.date_naive()),
            left_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        membership
            .insert(db)
            .await
            .expect("Failed to insert membership");
        println!("  Created membership for {user_id}");
    }
}

fn print_dev_tokens() {
    let secret = std::env::var("TWUNGURANE__JWT__SECRET")
        .unwrap_or_else(|_| JwtConfig::default().secret);
    let service = JwtService::new(JwtConfig {
        secret,
        ..JwtConfig::default()
    });

    println!("\nDevelopment tokens (1h):");
    for (label, id, role) in [
        ("platform admin", admin_user_id(), "admin"),
        ("treasurer", treasurer_user_id(), "member"),
        ("member", member_user_id(), "member"),
    ] {
        match service.generate_access_token(id, role) {
            Ok(token) => println!("  {label}: {token}"),
            Err(e) => println!("  {label}: failed to generate token: {e}"),
        }
    }
}
