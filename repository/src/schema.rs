//! Reference schema this crate assumes is already applied by the
//! migration-SQL runner (out of scope per spec.md §1 — we document the
//! schema we query against, we do not ship or run a migration tool).
//!
//! ```sql
//! CREATE SEQUENCE alarm_sequence_seq;
//!
//! CREATE TABLE resource_pool (
//!     resource_pool_id uuid PRIMARY KEY,
//!     name text NOT NULL,
//!     description text,
//!     o_cloud_site_id uuid,
//!     extensions jsonb NOT NULL DEFAULT '{}',
//!     data_source_id uuid NOT NULL,
//!     generation_id bigint NOT NULL,
//!     external_id text NOT NULL,
//!     created_at timestamptz NOT NULL DEFAULT now(),
//!     UNIQUE (data_source_id, external_id)
//! );
//!
//! CREATE TABLE resource (
//!     resource_id uuid PRIMARY KEY,
//!     resource_type_id uuid NOT NULL,
//!     resource_pool_id uuid NOT NULL REFERENCES resource_pool,
//!     description text,
//!     extensions jsonb NOT NULL DEFAULT '{}',
//!     data_source_id uuid NOT NULL,
//!     generation_id bigint NOT NULL,
//!     external_id text NOT NULL,
//!     created_at timestamptz NOT NULL DEFAULT now(),
//!     UNIQUE (data_source_id, external_id)
//! );
//!
//! CREATE TABLE node_cluster_type (
//!     node_cluster_type_id uuid PRIMARY KEY,
//!     name text NOT NULL,
//!     extensions jsonb NOT NULL DEFAULT '{}'
//! );
//!
//! CREATE TABLE alarm_dictionary (
//!     alarm_dictionary_id uuid PRIMARY KEY,
//!     alarm_dictionary_version text NOT NULL,
//!     entity_type text NOT NULL,
//!     vendor text NOT NULL,
//!     node_cluster_type_id uuid NOT NULL UNIQUE REFERENCES node_cluster_type,
//!     generation_id bigint NOT NULL
//! );
//!
//! CREATE TABLE alarm_definition (
//!     alarm_definition_id uuid PRIMARY KEY,
//!     alarm_dictionary_id uuid NOT NULL REFERENCES alarm_dictionary,
//!     alarm_name text NOT NULL,
//!     alarm_severity smallint NOT NULL,
//!     alarm_description text,
//!     proposed_repair_action text,
//!     additional_fields jsonb NOT NULL DEFAULT '{}',
//!     UNIQUE (alarm_dictionary_id, alarm_name, alarm_severity)
//! );
//!
//! CREATE TABLE alarm_event_record (
//!     alarm_event_record_id uuid PRIMARY KEY,
//!     alarm_definition_id uuid REFERENCES alarm_definition,
//!     probable_cause_id uuid,
//!     alarm_raised_time timestamptz NOT NULL,
//!     alarm_changed_time timestamptz NOT NULL,
//!     alarm_cleared_time timestamptz,
//!     alarm_acknowledged boolean NOT NULL DEFAULT false,
//!     alarm_acknowledged_time timestamptz,
//!     perceived_severity smallint NOT NULL,
//!     extensions jsonb NOT NULL DEFAULT '{}',
//!     object_id uuid NOT NULL,
//!     object_type_id uuid NOT NULL,
//!     resource_type_id uuid,
//!     notification_event_type text NOT NULL,
//!     alarm_status text NOT NULL,
//!     fingerprint text NOT NULL,
//!     alarm_sequence_number bigint NOT NULL DEFAULT nextval('alarm_sequence_seq'),
//!     created_at timestamptz NOT NULL DEFAULT now(),
//!     generation_id bigint NOT NULL,
//!     source text NOT NULL,
//!     UNIQUE (fingerprint, alarm_raised_time)
//! );
//! -- trigger bump_alarm_sequence: on UPDATE, if status transitions to
//! --   'resolved' OR alarm_changed_time changes, reassign
//! --   alarm_sequence_number := nextval('alarm_sequence_seq').
//! -- trigger track_alarm_changed_time: on INSERT, alarm_changed_time :=
//! --   alarm_raised_time; on UPDATE, if NOT alarm_acknowledged and any of
//! --   {status, cleared_time, severity, object_id, object_type_id,
//! --   alarm_definition_id, probable_cause_id} differs, alarm_changed_time
//! --   := now().
//!
//! CREATE TABLE subscription (
//!     subscription_id uuid PRIMARY KEY,
//!     consumer_subscription_id text NOT NULL,
//!     callback_url text NOT NULL UNIQUE,
//!     filter text,
//!     event_cursor bigint NOT NULL DEFAULT 0,
//!     created_at timestamptz NOT NULL DEFAULT now()
//! );
//!
//! CREATE TABLE data_change_event (
//!     data_change_event_id uuid PRIMARY KEY,
//!     object_type text NOT NULL,
//!     object_id uuid NOT NULL,
//!     operation text NOT NULL,
//!     before jsonb,
//!     after jsonb,
//!     sequence bigint NOT NULL DEFAULT nextval('alarm_sequence_seq'),
//!     claimed_at timestamptz,
//!     created_at timestamptz NOT NULL DEFAULT now()
//! );
//! -- trigger notify_outbox_queued: AFTER INSERT ON data_change_event,
//! --   PERFORM pg_notify('alarm_event_record_outbox_queued', NEW.id::text).
//!
//! CREATE TABLE notification_cursor (
//!     last_swept_sequence bigint NOT NULL,
//!     last_swept_at timestamptz NOT NULL
//! );
//!
//! CREATE TABLE data_source (
//!     data_source_id uuid PRIMARY KEY,
//!     kind text NOT NULL,
//!     current_generation bigint NOT NULL DEFAULT 0
//! );
//! ```
