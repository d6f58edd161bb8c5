diesel::table! {
    leads (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        website_url -> Varchar,
        team_size -> Varchar,
        arr -> Float8,
        category -> Varchar,
        linkedin_url -> Varchar,
        status -> Varchar,
        funding_type -> Varchar,
        follow_up_date -> Nullable<Date>,
        edition -> Varchar,
        product_name -> Varchar,
        added_by -> Nullable<Uuid>,
        added_by_name -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    deals (id) {
        id -> Uuid,
        name -> Varchar,
        lead_name -> Varchar,
        lead_id -> Nullable<Uuid>,
        value -> Float8,
        stage -> Varchar,
        assigned_rep -> Varchar,
        edition -> Varchar,
        start_month -> Int4,
        end_month -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    sales_reps (id) {
        id -> Uuid,
        name -> Varchar,
        leads_contacted -> Int4,
        meetings_booked -> Int4,
        deals_closed -> Int4,
        total_revenue -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    team_members (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        role -> Varchar,
        permissions -> Jsonb,
        status -> Varchar,
        last_login -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    contacts (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        company -> Varchar,
        status -> Varchar,
        assigned_rep -> Varchar,
        notes -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(deals -> leads (lead_id));

diesel::allow_tables_to_appear_in_same_query!(leads, deals, sales_reps, team_members, contacts);
