//! Esquema Diesel escrito a mano a partir de `migrations/`. Las columnas
//! conservan nulabilidad y nombres del esquema original
//! (`contracts.counterparty` guarda el id de la organización como texto).

diesel::table! {
    organizations (id) {
        id -> Integer,
        name -> Text,
        organization_type -> Nullable<Text>,
        inn -> Nullable<Text>,
        kpp -> Nullable<Text>,
        ogrn -> Nullable<Text>,
        legal_address -> Nullable<Text>,
        phone -> Nullable<Text>,
        email -> Nullable<Text>,
        created_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    users (id) {
        id -> Integer,
        username -> Text,
        full_name -> Text,
        password -> Text,
        department -> Nullable<Text>,
        position -> Nullable<Text>,
        is_active -> Nullable<Bool>,
        created_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    roles (id) {
        id -> Integer,
        name -> Text,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    user_roles (user_id, role_id) {
        user_id -> Integer,
        role_id -> Integer,
    }
}

diesel::table! {
    contracts (id) {
        id -> Integer,
        contract_number -> Nullable<Text>,
        title -> Text,
        counterparty -> Nullable<Text>,
        amount -> Nullable<Double>,
        status -> Nullable<Text>,
        owner_id -> Nullable<Integer>,
        department -> Nullable<Text>,
        file_path -> Nullable<Text>,
        priority -> Nullable<Text>,
        deadline_at -> Nullable<Timestamp>,
        created_at -> Nullable<Timestamp>,
        updated_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    approval_flows (id) {
        id -> Integer,
        name -> Text,
        description -> Nullable<Text>,
        department -> Nullable<Text>,
        steps -> Nullable<Text>,
    }
}

diesel::table! {
    approval_instances (id) {
        id -> Integer,
        contract_id -> Nullable<Integer>,
        flow_id -> Nullable<Integer>,
        status -> Nullable<Text>,
        started_at -> Nullable<Timestamp>,
        finished_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    approval_tasks (id) {
        id -> Integer,
        instance_id -> Nullable<Integer>,
        step_order -> Nullable<Integer>,
        role_name -> Nullable<Text>,
        assigned_user_id -> Nullable<Integer>,
        status -> Nullable<Text>,
        assigned_at -> Nullable<Timestamp>,
        completed_at -> Nullable<Timestamp>,
        comment -> Nullable<Text>,
        deadline_at -> Nullable<Timestamp>,
        deadline_notified -> Nullable<Bool>,
    }
}

diesel::table! {
    audit_log (id) {
        id -> Integer,
        user_id -> Nullable<Integer>,
        action -> Nullable<Text>,
        details -> Nullable<Text>,
        created_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    assignment_cursors (role_name) {
        role_name -> Text,
        next_index -> BigInt,
    }
}

diesel::joinable!(user_roles -> users (user_id));
diesel::joinable!(user_roles -> roles (role_id));

diesel::allow_tables_to_appear_in_same_query!(
    organizations,
    users,
    roles,
    user_roles,
    contracts,
    approval_flows,
    approval_instances,
    approval_tasks,
    audit_log,
    assignment_cursors,
);
