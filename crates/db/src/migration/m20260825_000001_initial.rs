//! Initial database migration.
//!
//! Creates all enums, tables and indexes for the savings-group ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(GROUPS_SQL).await?;
        db.execute_unprepared(GROUP_MEMBERS_SQL).await?;
        db.execute_unprepared(LOANS_SQL).await?;
        db.execute_unprepared(CONTRIBUTIONS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'member');

CREATE TYPE group_type AS ENUM ('vsla', 'tontine', 'solidarity');

CREATE TYPE group_status AS ENUM ('active', 'suspended', 'terminated');

CREATE TYPE frequency AS ENUM ('weekly', 'biweekly', 'monthly');

CREATE TYPE member_role AS ENUM ('admin', 'treasurer', 'member');

CREATE TYPE member_status AS ENUM ('active', 'suspended', 'removed');

CREATE TYPE contribution_type AS ENUM (
    'savings',
    'penalty',
    'repayment',
    'interest',
    'fee',
    'withdrawal'
);

CREATE TYPE contribution_status AS ENUM ('pending', 'validated', 'cancelled');

CREATE TYPE payment_method AS ENUM (
    'lumicash',
    'ecocash',
    'mpesa',
    'cash',
    'bank_transfer'
);

CREATE TYPE loan_status AS ENUM (
    'pending',
    'approved',
    'rejected',
    'active',
    'repaid'
);

CREATE TYPE transaction_type AS ENUM (
    'contribution_savings',
    'contribution_penalty',
    'contribution_interest',
    'contribution_fee',
    'withdrawal',
    'loan_disbursement',
    'loan_repayment'
);

CREATE TYPE transaction_source AS ENUM (
    'lumicash',
    'ecocash',
    'mpesa',
    'cash',
    'bank_transfer',
    'internal'
);

CREATE TYPE transaction_status AS ENUM ('completed', 'pending', 'failed');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    full_name VARCHAR(255) NOT NULL,
    phone VARCHAR(20) NOT NULL UNIQUE,
    email VARCHAR(255),
    role user_role NOT NULL DEFAULT 'member',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const GROUPS_SQL: &str = r"
CREATE TABLE groups (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    group_type group_type NOT NULL,
    status group_status NOT NULL DEFAULT 'active',
    contribution_amount DECIMAL(15,2) NOT NULL CHECK (contribution_amount > 0),
    frequency frequency NOT NULL,
    interest_rate DECIMAL(5,2) NOT NULL CHECK (interest_rate >= 0 AND interest_rate <= 100),
    penalty_rate DECIMAL(5,2) NOT NULL CHECK (penalty_rate >= 0 AND penalty_rate <= 100),
    duration_months INTEGER NOT NULL CHECK (duration_months BETWEEN 1 AND 24),
    max_members INTEGER NOT NULL CHECK (max_members BETWEEN 2 AND 50),
    balance DECIMAL(15,2) NOT NULL DEFAULT 0 CHECK (balance >= 0),
    created_by UUID NOT NULL REFERENCES users(id),
    deleted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_groups_status ON groups(status) WHERE deleted_at IS NULL;
";

const GROUP_MEMBERS_SQL: &str = r"
CREATE TABLE group_members (
    id UUID PRIMARY KEY,
    group_id UUID NOT NULL REFERENCES groups(id),
    user_id UUID NOT NULL REFERENCES users(id),
    role member_role NOT NULL DEFAULT 'member',
    status member_status NOT NULL DEFAULT 'active',
    total_savings DECIMAL(15,2) NOT NULL DEFAULT 0 CHECK (total_savings >= 0),
    joined_at DATE NOT NULL,
    left_at DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_group_members_group_user UNIQUE (group_id, user_id)
);

CREATE INDEX idx_group_members_group ON group_members(group_id);
CREATE INDEX idx_group_members_user ON group_members(user_id);
";

const LOANS_SQL: &str = r"
CREATE TABLE loans (
    id UUID PRIMARY KEY,
    group_id UUID NOT NULL REFERENCES groups(id),
    user_id UUID NOT NULL REFERENCES users(id),
    principal DECIMAL(15,2) NOT NULL CHECK (principal > 0),
    interest_rate DECIMAL(5,2) NOT NULL CHECK (interest_rate >= 0 AND interest_rate <= 100),
    term_months INTEGER NOT NULL CHECK (term_months BETWEEN 1 AND 12),
    interest DECIMAL(15,2) NOT NULL CHECK (interest >= 0),
    total_payable DECIMAL(15,2) NOT NULL CHECK (total_payable >= principal),
    monthly_installment DECIMAL(15,2) NOT NULL CHECK (monthly_installment > 0),
    amount_repaid DECIMAL(15,2) NOT NULL DEFAULT 0
        CHECK (amount_repaid >= 0 AND amount_repaid <= total_payable),
    repayment_count INTEGER NOT NULL DEFAULT 0,
    purpose TEXT NOT NULL,
    guarantee TEXT,
    status loan_status NOT NULL DEFAULT 'pending',
    requested_at TIMESTAMPTZ NOT NULL,
    approved_by UUID REFERENCES users(id),
    approved_at TIMESTAMPTZ,
    rejected_by UUID REFERENCES users(id),
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    due_date DATE,
    completed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_loans_group ON loans(group_id);
CREATE INDEX idx_loans_user ON loans(user_id);
CREATE INDEX idx_loans_status ON loans(status);

-- One outstanding loan per member per group
CREATE UNIQUE INDEX uq_loans_one_outstanding
    ON loans(group_id, user_id)
    WHERE status IN ('pending', 'approved', 'active');
";

const CONTRIBUTIONS_SQL: &str = r"
CREATE TABLE contributions (
    id UUID PRIMARY KEY,
    group_id UUID NOT NULL REFERENCES groups(id),
    user_id UUID NOT NULL REFERENCES users(id),
    loan_id UUID REFERENCES loans(id),
    amount DECIMAL(15,2) NOT NULL CHECK (amount > 0),
    contribution_type contribution_type NOT NULL,
    payment_method payment_method NOT NULL,
    contribution_date DATE NOT NULL,
    notes TEXT,
    status contribution_status NOT NULL DEFAULT 'pending',
    validated_by UUID REFERENCES users(id),
    validated_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT chk_repayment_has_loan
        CHECK (contribution_type != 'repayment' OR loan_id IS NOT NULL)
);

CREATE INDEX idx_contributions_group ON contributions(group_id);
CREATE INDEX idx_contributions_user ON contributions(user_id);
CREATE INDEX idx_contributions_date ON contributions(contribution_date);
CREATE INDEX idx_contributions_loan ON contributions(loan_id) WHERE loan_id IS NOT NULL;
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    reference VARCHAR(32) NOT NULL UNIQUE,
    group_id UUID NOT NULL REFERENCES groups(id),
    user_id UUID NOT NULL REFERENCES users(id),
    amount DECIMAL(15,2) NOT NULL CHECK (amount > 0),
    transaction_type transaction_type NOT NULL,
    source transaction_source NOT NULL DEFAULT 'internal',
    status transaction_status NOT NULL DEFAULT 'completed',
    description TEXT NOT NULL,
    transaction_date DATE NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_transactions_group ON transactions(group_id);
CREATE INDEX idx_transactions_user ON transactions(user_id);
CREATE INDEX idx_transactions_type ON transactions(transaction_type);
CREATE INDEX idx_transactions_created ON transactions(created_at);
CREATE INDEX idx_transactions_date ON transactions(transaction_date);

-- Append-only: the application never deletes. Mobile-money settlement
-- is the only permitted update; it flips the status and finalizes the
-- amount at what the loan actually accepted.
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS contributions CASCADE;
DROP TABLE IF EXISTS loans CASCADE;
DROP TABLE IF EXISTS group_members CASCADE;
DROP TABLE IF EXISTS groups CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS transaction_source;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS loan_status;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS contribution_status;
DROP TYPE IF EXISTS contribution_type;
DROP TYPE IF EXISTS member_status;
DROP TYPE IF EXISTS member_role;
DROP TYPE IF EXISTS group_status;
DROP TYPE IF EXISTS group_type;
DROP TYPE IF EXISTS frequency;
DROP TYPE IF EXISTS user_role;
";
