use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    GoogleId,
    Email,
    Gmail,
    PhoneNo,
    Address,
    ProfilePicture,
    Name,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Listings {
    Table,
    Id,
    Title,
    Description,
    Images,
    Price,
    Location,
    Country,
    Lat,
    Lng,
    OwnerId,
    CreatedAt,
    LabelsFolded,
    TextFolded,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    ListingId,
    AuthorId,
    Rating,
    Comment,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ReferenceSets {
    Table,
    Id,
    SetKind,
    OwnerId,
    TargetId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().null())
                    .col(ColumnDef::new(Users::GoogleId).string().null().unique_key())
                    .col(ColumnDef::new(Users::Email).string().null().unique_key())
                    .col(ColumnDef::new(Users::Gmail).string().null())
                    .col(ColumnDef::new(Users::PhoneNo).string().null())
                    .col(ColumnDef::new(Users::Address).string().null())
                    .col(ColumnDef::new(Users::ProfilePicture).string().null())
                    .col(ColumnDef::new(Users::Name).string().null())
                    .col(
                        ColumnDef::new(Users::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Listings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Listings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Listings::Title).string().not_null())
                    .col(ColumnDef::new(Listings::Description).text().null())
                    .col(ColumnDef::new(Listings::Images).json().not_null())
                    .col(ColumnDef::new(Listings::Price).double().not_null())
                    .col(ColumnDef::new(Listings::Location).string().null())
                    .col(ColumnDef::new(Listings::Country).string().null())
                    .col(ColumnDef::new(Listings::Lat).double().null())
                    .col(ColumnDef::new(Listings::Lng).double().null())
                    .col(ColumnDef::new(Listings::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Listings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Listings::LabelsFolded).text().not_null())
                    .col(ColumnDef::new(Listings::TextFolded).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listings_owner")
                    .table(Listings::Table)
                    .col(Listings::OwnerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reviews::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Reviews::ListingId).uuid().not_null())
                    .col(ColumnDef::new(Reviews::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                    .col(ColumnDef::new(Reviews::Comment).text().not_null())
                    .col(
                        ColumnDef::new(Reviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reviews::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_listing")
                    .table(Reviews::Table)
                    .col(Reviews::ListingId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReferenceSets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReferenceSets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReferenceSets::SetKind).string().not_null())
                    .col(ColumnDef::new(ReferenceSets::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(ReferenceSets::TargetId).uuid().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_reference_sets_member")
                    .table(ReferenceSets::Table)
                    .col(ReferenceSets::SetKind)
                    .col(ReferenceSets::OwnerId)
                    .col(ReferenceSets::TargetId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reference_sets_target")
                    .table(ReferenceSets::Table)
                    .col(ReferenceSets::SetKind)
                    .col(ReferenceSets::TargetId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReferenceSets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reviews::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Listings::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await
    }
}
