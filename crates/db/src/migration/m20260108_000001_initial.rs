//! Initial database migration.
//!
//! Creates the enums, tables, constraints, triggers and row-level security
//! policies for the chart of accounts, document sequences, the journal, trade
//! documents and payments.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(CHART_OF_ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: DOCUMENT SEQUENCES
        // ============================================================
        db.execute_unprepared(DOCUMENT_SEQUENCES_SQL).await?;

        // ============================================================
        // PART 4: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 5: COUNTERPARTIES
        // ============================================================
        db.execute_unprepared(CONTACTS_SQL).await?;

        // ============================================================
        // PART 6: TRADE DOCUMENTS & PAYMENTS
        // ============================================================
        db.execute_unprepared(TRADE_DOCUMENTS_SQL).await?;
        db.execute_unprepared(TRADE_DOCUMENT_ITEMS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;

        // ============================================================
        // PART 7: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 8: ROW-LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

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
-- Account classification
CREATE TYPE account_type AS ENUM (
    'asset',
    'liability',
    'equity',
    'revenue',
    'expense'
);

CREATE TYPE normal_balance AS ENUM ('debit', 'credit');

-- Journal
CREATE TYPE journal_type AS ENUM (
    'general',
    'sales',
    'purchase',
    'receipt',
    'payment',
    'reversal'
);

CREATE TYPE journal_status AS ENUM ('posted');

-- Counterparties
CREATE TYPE contact_kind AS ENUM ('customer', 'vendor');

-- Trade documents
CREATE TYPE document_kind AS ENUM ('invoice', 'bill');

CREATE TYPE document_status AS ENUM (
    'draft',
    'approved',
    'partial',
    'overdue',
    'paid',
    'voided'
);

-- Payments
CREATE TYPE payment_type AS ENUM ('receive', 'pay');

CREATE TYPE payment_method AS ENUM (
    'cash',
    'bank_transfer',
    'cheque',
    'credit_card'
);
";

const CHART_OF_ACCOUNTS_SQL: &str = r"
CREATE TABLE chart_of_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    normal_balance normal_balance NOT NULL,
    level SMALLINT NOT NULL DEFAULT 1 CHECK (level >= 1),
    is_header BOOLEAN NOT NULL DEFAULT false,
    parent_id UUID,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (tenant_id, code),
    UNIQUE (tenant_id, id),
    -- Parent must live in the same tenant
    FOREIGN KEY (tenant_id, parent_id) REFERENCES chart_of_accounts(tenant_id, id),
    CHECK (parent_id IS NULL OR parent_id <> id)
);

CREATE INDEX idx_coa_tenant ON chart_of_accounts(tenant_id) WHERE is_active = true;
CREATE INDEX idx_coa_parent ON chart_of_accounts(parent_id) WHERE parent_id IS NOT NULL;
";

const DOCUMENT_SEQUENCES_SQL: &str = r"
-- One counter row per tenant + series + period (YYYYMM)
CREATE TABLE document_sequences (
    tenant_id UUID NOT NULL,
    series VARCHAR(10) NOT NULL,
    period CHAR(6) NOT NULL,
    last_value BIGINT NOT NULL CHECK (last_value > 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (tenant_id, series, period)
);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    entry_number VARCHAR(30) NOT NULL,
    entry_date DATE NOT NULL,
    journal_type journal_type NOT NULL,
    reference VARCHAR(100),
    description TEXT NOT NULL,
    total_debit NUMERIC(18, 2) NOT NULL,
    total_credit NUMERIC(18, 2) NOT NULL,
    status journal_status NOT NULL DEFAULT 'posted',
    reverses_entry_id UUID,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (tenant_id, entry_number),
    UNIQUE (tenant_id, id),
    FOREIGN KEY (tenant_id, reverses_entry_id) REFERENCES journal_entries(tenant_id, id),
    CHECK (total_debit > 0),
    CHECK (abs(total_debit - total_credit) <= 0.01)
);

CREATE INDEX idx_journal_entries_date ON journal_entries(tenant_id, entry_date);
-- An entry can be reversed once
CREATE UNIQUE INDEX idx_journal_entries_reverses
    ON journal_entries(reverses_entry_id)
    WHERE reverses_entry_id IS NOT NULL;
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    journal_entry_id UUID NOT NULL,
    line_number INTEGER NOT NULL CHECK (line_number >= 1),
    account_id UUID NOT NULL,
    description TEXT NOT NULL,
    debit NUMERIC(18, 2) NOT NULL DEFAULT 0,
    credit NUMERIC(18, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (journal_entry_id, line_number),
    FOREIGN KEY (tenant_id, journal_entry_id) REFERENCES journal_entries(tenant_id, id),
    FOREIGN KEY (tenant_id, account_id) REFERENCES chart_of_accounts(tenant_id, id),
    -- Non-negative and one-sided
    CHECK (debit >= 0 AND credit >= 0),
    CHECK (debit = 0 OR credit = 0)
);

CREATE INDEX idx_journal_lines_account ON journal_lines(tenant_id, account_id);
CREATE INDEX idx_journal_lines_entry ON journal_lines(journal_entry_id);
";

const CONTACTS_SQL: &str = r"
CREATE TABLE contacts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    kind contact_kind NOT NULL,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    tax_id VARCHAR(20),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (tenant_id, kind, code),
    UNIQUE (tenant_id, id)
);
";

const TRADE_DOCUMENTS_SQL: &str = r"
-- Sales invoices and purchase bills
CREATE TABLE trade_documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    kind document_kind NOT NULL,
    document_number VARCHAR(30) NOT NULL,
    document_date DATE NOT NULL,
    due_date DATE NOT NULL,
    contact_id UUID NOT NULL,
    external_reference VARCHAR(100),
    notes TEXT,
    subtotal NUMERIC(18, 2) NOT NULL,
    vat_amount NUMERIC(18, 2) NOT NULL,
    total_amount NUMERIC(18, 2) NOT NULL,
    paid_amount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    status document_status NOT NULL DEFAULT 'draft',
    journal_entry_id UUID,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (tenant_id, document_number),
    UNIQUE (tenant_id, id),
    FOREIGN KEY (tenant_id, contact_id) REFERENCES contacts(tenant_id, id),
    FOREIGN KEY (tenant_id, journal_entry_id) REFERENCES journal_entries(tenant_id, id),
    CHECK (subtotal >= 0 AND vat_amount >= 0),
    CHECK (total_amount = subtotal + vat_amount),
    CHECK (paid_amount >= 0 AND paid_amount <= total_amount),
    CHECK (due_date >= document_date),
    -- Only drafts are unposted
    CHECK (status IN ('draft', 'voided') OR journal_entry_id IS NOT NULL)
);

CREATE INDEX idx_trade_documents_kind ON trade_documents(tenant_id, kind, status);
CREATE INDEX idx_trade_documents_due ON trade_documents(tenant_id, due_date)
    WHERE status IN ('approved', 'partial');
";

const TRADE_DOCUMENT_ITEMS_SQL: &str = r"
CREATE TABLE trade_document_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    document_id UUID NOT NULL,
    line_number INTEGER NOT NULL CHECK (line_number >= 1),
    description TEXT NOT NULL,
    quantity NUMERIC(18, 4) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(18, 4) NOT NULL CHECK (unit_price >= 0),
    amount NUMERIC(18, 2) NOT NULL,
    UNIQUE (document_id, line_number),
    FOREIGN KEY (tenant_id, document_id) REFERENCES trade_documents(tenant_id, id) ON DELETE CASCADE
);
";

const PAYMENTS_SQL: &str = r"
-- Receipts against invoices, payment vouchers against bills
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL,
    document_number VARCHAR(30) NOT NULL,
    payment_date DATE NOT NULL,
    payment_type payment_type NOT NULL,
    payment_method payment_method NOT NULL,
    amount NUMERIC(18, 2) NOT NULL CHECK (amount > 0),
    document_id UUID NOT NULL,
    cash_account_id UUID NOT NULL,
    journal_entry_id UUID NOT NULL,
    notes TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (tenant_id, document_number),
    FOREIGN KEY (tenant_id, document_id) REFERENCES trade_documents(tenant_id, id),
    FOREIGN KEY (tenant_id, cash_account_id) REFERENCES chart_of_accounts(tenant_id, id),
    FOREIGN KEY (tenant_id, journal_entry_id) REFERENCES journal_entries(tenant_id, id)
);

CREATE INDEX idx_payments_document ON payments(document_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: check_journal_balance
-- Lines of an entry must sum to the header totals
-- ============================================================
CREATE OR REPLACE FUNCTION check_journal_balance()
RETURNS TRIGGER AS $$
DECLARE
    line_debit NUMERIC(18, 2);
    line_credit NUMERIC(18, 2);
    header_debit NUMERIC(18, 2);
    header_credit NUMERIC(18, 2);
BEGIN
    SELECT total_debit, total_credit
    INTO header_debit, header_credit
    FROM journal_entries
    WHERE id = NEW.journal_entry_id;

    SELECT
        COALESCE(SUM(debit), 0),
        COALESCE(SUM(credit), 0)
    INTO line_debit, line_credit
    FROM journal_lines
    WHERE journal_entry_id = NEW.journal_entry_id;

    IF line_debit <> header_debit OR line_credit <> header_credit THEN
        RAISE EXCEPTION 'Journal entry % lines (Dr %, Cr %) do not match totals (Dr %, Cr %)',
            NEW.journal_entry_id, line_debit, line_credit, header_debit, header_credit;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_check_journal_balance
AFTER INSERT ON journal_lines
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_journal_balance();

-- ============================================================
-- FUNCTION: prevent_journal_mutation
-- Posted entries are immutable; corrections are reversal entries
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_journal_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Posted journal rows cannot be modified or deleted';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_entry_mutation
BEFORE UPDATE OR DELETE ON journal_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_journal_mutation();

CREATE TRIGGER trg_prevent_line_mutation
BEFORE UPDATE OR DELETE ON journal_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_journal_mutation();

-- Payments are immutable too
CREATE TRIGGER trg_prevent_payment_mutation
BEFORE UPDATE OR DELETE ON payments
FOR EACH ROW
EXECUTE FUNCTION prevent_journal_mutation();
";

const RLS_SQL: &str = r"
-- ============================================================
-- ROW-LEVEL SECURITY POLICIES
-- Application sets context per transaction:
-- SET LOCAL app.current_tenant_id = 'tenant-uuid';
-- ============================================================

ALTER TABLE chart_of_accounts ENABLE ROW LEVEL SECURITY;
ALTER TABLE document_sequences ENABLE ROW LEVEL SECURITY;
ALTER TABLE journal_entries ENABLE ROW LEVEL SECURITY;
ALTER TABLE journal_lines ENABLE ROW LEVEL SECURITY;
ALTER TABLE contacts ENABLE ROW LEVEL SECURITY;
ALTER TABLE trade_documents ENABLE ROW LEVEL SECURITY;
ALTER TABLE trade_document_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE payments ENABLE ROW LEVEL SECURITY;

CREATE POLICY tenant_isolation ON chart_of_accounts
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON document_sequences
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON journal_entries
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON journal_lines
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON contacts
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON trade_documents
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON trade_document_items
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);

CREATE POLICY tenant_isolation ON payments
    USING (tenant_id = NULLIF(current_setting('app.current_tenant_id', true), '')::UUID);
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_prevent_payment_mutation ON payments;
DROP TRIGGER IF EXISTS trg_prevent_line_mutation ON journal_lines;
DROP TRIGGER IF EXISTS trg_prevent_entry_mutation ON journal_entries;
DROP TRIGGER IF EXISTS trg_check_journal_balance ON journal_lines;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_journal_mutation();
DROP FUNCTION IF EXISTS check_journal_balance();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS trade_document_items CASCADE;
DROP TABLE IF EXISTS trade_documents CASCADE;
DROP TABLE IF EXISTS contacts CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS document_sequences CASCADE;
DROP TABLE IF EXISTS chart_of_accounts CASCADE;

-- Drop enums
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS payment_type;
DROP TYPE IF EXISTS document_status;
DROP TYPE IF EXISTS document_kind;
DROP TYPE IF EXISTS contact_kind;
DROP TYPE IF EXISTS journal_status;
DROP TYPE IF EXISTS journal_type;
DROP TYPE IF EXISTS normal_balance;
DROP TYPE IF EXISTS account_type;
";
