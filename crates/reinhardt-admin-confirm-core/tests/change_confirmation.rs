//! Two-phase add/change flow against an in-memory admin

mod common;

use common::{MarketAdmin, confirm_admin, post, superuser};
use http::StatusCode;
use reinhardt_admin_confirm_core::model::{Fieldset, Record};
use reinhardt_admin_confirm_core::request::{AdminRequest, AdminUser};
use reinhardt_admin_confirm_core::{AdminResponse, ConfirmOptions, ExtraContext};
use rstest::rstest;
use serde_json::json;

fn existing_item(admin: &MarketAdmin) -> i64 {
	admin.insert(
		Record::new()
			.set("name", "item")
			.set("price", 1)
			.set("currency", "CAD"),
	)
}

fn page(response: &AdminResponse) -> &str {
	&response.template().unwrap().content
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn get_add_form_carries_confirm_add_marker(#[case] confirm_add: bool) {
	// Arrange
	let options = ConfirmOptions::builder().confirm_add(confirm_add).build();
	let admin = confirm_admin(MarketAdmin::inventory(), options);
	let request = AdminRequest::get("/admin/market/inventory/add/").with_user(superuser());

	// Act
	let response = admin
		.changeform_view(request, None, "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	let template = response.template().unwrap();
	assert_eq!(template.context_value("confirm_add"), Some(&json!(confirm_add)));
	assert_eq!(template.content.contains("_confirm_add"), confirm_add);
}

#[rstest]
#[tokio::test]
async fn get_change_form_carries_confirm_change_marker() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	let id = existing_item(admin.admin());
	let request = AdminRequest::get(format!("/admin/market/item/{}/change/", id)).with_user(superuser());

	// Act
	let response = admin
		.changeform_view(request, Some(&id.to_string()), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert!(page(&response).contains("_confirm_change"));
}

#[rstest]
#[tokio::test]
async fn post_add_without_marker_saves_directly() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	let request = post(
		"/admin/market/item/add/",
		&[("name", "name"), ("price", "2.0"), ("currency", "CAD"), ("_save", "Save")],
	);

	// Act
	let response = admin
		.changeform_view(request, None, "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.status_code(), StatusCode::FOUND);
	assert_eq!(response.location(), Some("/admin/market/item/"));
	assert_eq!(admin.admin().count(), 1);
}

#[rstest]
#[tokio::test]
async fn post_add_with_confirm_add_renders_confirmation() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::inventory(), ConfirmOptions::new());
	let request = post(
		"/admin/market/inventory/add/",
		&[
			("shop", "1"),
			("item", "2"),
			("quantity", "5"),
			("_confirm_add", "True"),
			("_continue", "True"),
		],
	);

	// Act
	let response = admin
		.changeform_view(request, None, "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.status_code(), StatusCode::OK);
	let template = response.template().unwrap();
	assert_eq!(
		template.template_name,
		vec![
			"admin/market/inventory/change_confirmation.html",
			"admin/market/change_confirmation.html",
			"admin/change_confirmation.html",
		]
	);
	for (name, value) in [("shop", "1"), ("item", "2"), ("quantity", "5")] {
		assert!(template
			.content
			.contains(&format!(r#"<input type="hidden" name="{}" value="{}">"#, name, value)));
	}
	assert!(template
		.content
		.contains(r#"<input type="submit" value="Yes, I’m sure" name="_continue">"#));
	assert!(!template.content.contains("_confirm_add"));
	assert!(!template.content.contains("_confirmation_received"));
	assert_eq!(template.context_value("add"), Some(&json!(true)));
	assert_eq!(admin.admin().count(), 0);
}

#[rstest]
#[tokio::test]
async fn post_change_with_confirm_change_renders_confirmation() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	let id = existing_item(admin.admin());
	let id_str = id.to_string();
	let request = post(
		&format!("/admin/market/item/{}/change/", id),
		&[
			("name", "name"),
			("price", "2.0"),
			("currency", "CAD"),
			("id", &id_str),
			("_confirm_change", "True"),
			("csrfmiddlewaretoken", "fake token"),
			("_save", "True"),
		],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	let template = response.template().unwrap();
	assert_eq!(template.resolved, "admin/change_confirmation.html");
	assert_eq!(template.template_name[0], "admin/market/item/change_confirmation.html");
	assert!(template.content.contains(r#"<input type="hidden" name="price" value="2.0">"#));
	assert!(template
		.content
		.contains(r#"<input type="hidden" name="_confirmation_received" value="True">"#));
	assert!(template
		.content
		.contains(r#"<input type="submit" value="Yes, I’m sure" name="_save">"#));
	assert!(!template.content.contains("_confirm_change"));
	assert_eq!(template.content.matches("fake token").count(), 1);
	assert!(template
		.content
		.contains(r#"<input type="hidden" name="csrfmiddlewaretoken" value="fake token">"#));
	assert_eq!(
		template.context_value("confirmation_fields"),
		Some(&json!(["name", "price"]))
	);
	assert_eq!(admin.admin().row(id).unwrap().get("name"), &json!("item"));
}

#[rstest]
#[tokio::test]
async fn confirmation_page_carries_the_host_issued_csrf_token() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	let request = post(
		"/admin/market/item/add/",
		&[
			("name", "name"),
			("price", "2.0"),
			("currency", "CAD"),
			("_confirm_add", "True"),
			("csrfmiddlewaretoken", "stale"),
			("_save", "True"),
		],
	)
	.with_csrf_token("rotated");

	// Act
	let response = admin
		.changeform_view(request, None, "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	let template = response.template().unwrap();
	assert!(template
		.content
		.contains(r#"<input type="hidden" name="csrfmiddlewaretoken" value="rotated">"#));
	assert!(!template.content.contains("stale"));
	assert_eq!(template.context_value("csrf_token"), Some(&json!("rotated")));
}

#[rstest]
#[tokio::test]
async fn change_outside_confirmation_fields_saves_directly() {
	// Arrange
	let options = ConfirmOptions::builder()
		.confirm_change(true)
		.confirmation_fields(vec!["quantity"])
		.build();
	let admin = confirm_admin(MarketAdmin::inventory(), options);
	let id = admin.admin().insert(
		Record::new()
			.set("shop", 1)
			.set("item", 1)
			.set("quantity", 5)
			.set("notes", "This is the default"),
	);
	let id_str = id.to_string();
	let request = post(
		&format!("/admin/market/inventory/{}/change/", id),
		&[
			("shop", "2"),
			("item", "1"),
			("quantity", "5"),
			("notes", "This is the default"),
			("_confirm_change", "True"),
			("_save", "Save"),
		],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.location(), Some("/admin/market/inventory/"));
	assert_eq!(admin.admin().row(id).unwrap().get("shop"), &json!(2));
}

#[rstest]
#[tokio::test]
async fn change_inside_confirmation_fields_shows_every_changed_field() {
	// Arrange
	let options = ConfirmOptions::builder()
		.confirm_change(true)
		.confirmation_fields(vec!["quantity"])
		.build();
	let admin = confirm_admin(MarketAdmin::inventory(), options);
	let id = admin.admin().insert(Record::new().set("shop", 1).set("item", 1).set("quantity", 5));
	let id_str = id.to_string();
	let request = post(
		&format!("/admin/market/inventory/{}/change/", id),
		&[
			("shop", "2"),
			("item", "1"),
			("quantity", "7"),
			("_confirm_change", "True"),
			("_save", "Save"),
		],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	let template = response.template().unwrap();
	let changed = template.context_value("changed_data").unwrap().as_array().unwrap();
	let fields: Vec<&str> = changed
		.iter()
		.map(|change| change["field"].as_str().unwrap())
		.collect();
	assert_eq!(fields, vec!["shop", "quantity"]);
	assert_eq!(template.context_value("confirmation_fields"), Some(&json!(["quantity"])));
	assert_eq!(admin.admin().row(id).unwrap().get("quantity"), &json!(5));
}

#[rstest]
#[tokio::test]
async fn invalid_form_falls_through_to_the_host_view() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	let request = post(
		"/admin/market/item/add/",
		&[("name", ""), ("price", "2"), ("currency", "CAD"), ("_confirm_add", "True"), ("_save", "Save")],
	);

	// Act
	let response = admin
		.changeform_view(request, None, "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	let template = response.template().unwrap();
	assert_eq!(template.resolved, "admin/change_form.html");
	assert_eq!(
		template.context_value("errors"),
		Some(&json!({"name": ["This field is required."]}))
	);
	assert_eq!(admin.admin().count(), 0);
}

#[rstest]
#[tokio::test]
async fn disallowed_to_field_is_a_bad_request() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	let id = existing_item(admin.admin());
	let request = post(
		"/admin/market/item/1/change/",
		&[("name", "name"), ("_to_field", "name"), ("_confirm_change", "True")],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id.to_string()), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
	assert!(matches!(
		response,
		AdminResponse::BadRequest(ref message) if message == "The field name cannot be referenced."
	));
}

#[rstest]
#[case(None)]
#[case(Some("1"))]
#[tokio::test]
async fn missing_permission_is_forbidden(#[case] object_id: Option<&str>) {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	existing_item(admin.admin());
	let marker = if object_id.is_some() { "_confirm_change" } else { "_confirm_add" };
	let user = AdminUser::staff("user").with_permission("market.view_item");
	let request = AdminRequest::post(
		"/admin/market/item/",
		reinhardt_admin_confirm_core::request::PostData::from_pairs([
			("name", "name"),
			("price", "2"),
			("currency", "CAD"),
			(marker, "True"),
		]),
	)
	.with_user(user);

	// Act
	let response = admin
		.changeform_view(request, object_id, "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
	assert_eq!(admin.admin().row(1).unwrap().get("name"), &json!("item"));
}

#[rstest]
#[tokio::test]
async fn missing_object_redirects_to_admin_index() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	let request = post(
		"/admin/market/item/99/change/",
		&[("name", "name"), ("_confirm_change", "True")],
	);

	// Act
	let response = admin
		.changeform_view(request, Some("99"), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.status_code(), StatusCode::FOUND);
	assert_eq!(response.location(), Some("/admin/"));
	assert!(response.messages()[0].contains("doesn’t exist"));
}

#[rstest]
#[tokio::test]
async fn save_as_new_is_confirmed_as_an_add() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::item(), ConfirmOptions::new());
	let id = existing_item(admin.admin());
	let id_str = id.to_string();
	let request = post(
		&format!("/admin/market/item/{}/change/", id),
		&[
			("name", "item"),
			("price", "1"),
			("currency", "CAD"),
			("_confirm_change", "True"),
			("_saveasnew", "Save as new"),
		],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	let template = response.template().unwrap();
	assert_eq!(template.context_value("add"), Some(&json!(true)));
	assert_eq!(template.context_value("submit_name"), Some(&json!("_saveasnew")));
	assert!(template.content.contains("Confirm Add item"));
}

#[rstest]
#[tokio::test]
async fn resubmitting_the_confirmation_page_saves() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::inventory(), ConfirmOptions::new());
	let id = admin.admin().insert(Record::new().set("shop", 1).set("item", 1).set("quantity", 5));
	let id_str = id.to_string();
	let path = format!("/admin/market/inventory/{}/change/", id);
	let first = post(
		&path,
		&[("shop", "1"), ("item", "1"), ("quantity", "9"), ("_confirm_change", "True"), ("_continue", "Save")],
	);
	let confirmation = admin
		.changeform_view(first, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();
	assert_eq!(confirmation.status_code(), StatusCode::OK);

	// Act
	let second = post(&path, &[("shop", "1"), ("item", "1"), ("quantity", "9"), ("_continue", "")]);
	let response = admin
		.changeform_view(second, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.location(), Some(path.as_str()));
	assert_eq!(admin.admin().row(id).unwrap().get("quantity"), &json!(9));
}

#[rstest]
#[tokio::test]
async fn reordered_many_to_many_is_not_a_change() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::shopping_mall(), ConfirmOptions::new());
	let id = admin
		.admin()
		.insert(Record::new().set("name", "mall").set("shops", json!([1, 2, 3])));
	let id_str = id.to_string();
	let request = post(
		&format!("/admin/market/shoppingmall/{}/change/", id),
		&[
			("name", "mall"),
			("shops", "3"),
			("shops", "1"),
			("shops", "2"),
			("_confirm_change", "True"),
			("_save", "Save"),
		],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.status_code(), StatusCode::FOUND);
}

#[rstest]
#[tokio::test]
async fn many_to_many_values_are_all_embedded() {
	// Arrange
	let admin = confirm_admin(MarketAdmin::shopping_mall(), ConfirmOptions::new());
	let id = admin
		.admin()
		.insert(Record::new().set("name", "mall").set("shops", json!([1])));
	let id_str = id.to_string();
	let request = post(
		&format!("/admin/market/shoppingmall/{}/change/", id),
		&[
			("name", "mall"),
			("shops", "1"),
			("shops", "2"),
			("_confirm_change", "True"),
			("_save", "Save"),
		],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	let content = page(&response);
	assert!(content.contains(r#"<input type="hidden" name="shops" value="1">"#));
	assert!(content.contains(r#"<input type="hidden" name="shops" value="2">"#));
	assert!(content.contains("<td>shops</td><td>1</td><td>1, 2</td>"));
}

#[rstest]
#[tokio::test]
async fn fields_outside_the_fieldsets_are_ignored() {
	// Arrange
	let host = MarketAdmin::shopping_mall().with_fieldsets(vec![Fieldset::new(None, vec!["shops"])]);
	let admin = confirm_admin(host, ConfirmOptions::new());
	let id = admin
		.admin()
		.insert(Record::new().set("name", "mall").set("shops", json!([1])));
	let id_str = id.to_string();
	let request = post(
		&format!("/admin/market/shoppingmall/{}/change/", id),
		&[("name", "renamed"), ("shops", "1"), ("_confirm_change", "True"), ("_save", "Save")],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert_eq!(response.status_code(), StatusCode::FOUND);
}

#[rstest]
#[tokio::test]
async fn readonly_fields_never_need_confirmation() {
	// Arrange
	let host = MarketAdmin::shopping_mall().with_readonly(&["name"]);
	let admin = confirm_admin(host, ConfirmOptions::new());
	let id = admin
		.admin()
		.insert(Record::new().set("name", "mall").set("shops", json!([1])));
	let id_str = id.to_string();
	let request = post(
		&format!("/admin/market/shoppingmall/{}/change/", id),
		&[("name", "renamed"), ("shops", "1"), ("_confirm_change", "True"), ("_save", "Save")],
	);

	// Act
	let response = admin
		.changeform_view(request, Some(&id_str), "", ExtraContext::new())
		.await
		.unwrap();

	// Assert
	assert!(response.template().is_none());
}
